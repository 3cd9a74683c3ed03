//! Counterfactual robustness validation.
//!
//! The critic stresses a baseline prediction by re-running the same
//! prediction procedure on perturbed variants of the input dataset and
//! measuring how often the predicted signs survive. Low consistency is the
//! profit-mirage signature: a result that only holds on one exact draw of
//! history.

pub mod consistency;
pub mod counterfactual;
