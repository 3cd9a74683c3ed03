//! Prediction Consistency (PC): mean sign-agreement between a baseline
//! prediction and predictions under counterfactual perturbation.
//!
//! Missing signal is worst case: an empty baseline or an empty scenario list
//! scores 0.0 and is flagged, never treated as perfect agreement.

use serde::{Deserialize, Serialize};

use super::counterfactual::CounterfactualScenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Mean per-scenario sign-match fraction, in [0, 1].
    pub prediction_consistency: f64,
    pub flagged: bool,
    pub reason: Option<String>,
    pub threshold: f64,
}

fn sign(x: f64) -> i8 {
    if x.is_nan() || x == 0.0 {
        0
    } else if x > 0.0 {
        1
    } else {
        -1
    }
}

/// Fraction of elements whose sign matches the baseline. A length mismatch is
/// total disagreement (0.0), not an error.
fn match_fraction(baseline: &[f64], scenario: &[f64]) -> f64 {
    if scenario.len() != baseline.len() || baseline.is_empty() {
        return 0.0;
    }
    let matches = baseline
        .iter()
        .zip(scenario.iter())
        .filter(|(b, s)| sign(**b) == sign(**s))
        .count();
    matches as f64 / baseline.len() as f64
}

pub fn prediction_consistency(baseline: &[f64], counterfactuals: &[Vec<f64>]) -> f64 {
    if baseline.is_empty() || counterfactuals.is_empty() {
        return 0.0;
    }
    let total: f64 = counterfactuals
        .iter()
        .map(|cf| match_fraction(baseline, cf))
        .sum();
    total / counterfactuals.len() as f64
}

pub fn score(baseline: &[f64], counterfactuals: &[Vec<f64>], threshold: f64) -> ConsistencyReport {
    if baseline.is_empty() {
        return ConsistencyReport {
            prediction_consistency: 0.0,
            flagged: true,
            reason: Some("missing baseline prediction".to_string()),
            threshold,
        };
    }
    if counterfactuals.is_empty() {
        return ConsistencyReport {
            prediction_consistency: 0.0,
            flagged: true,
            reason: Some("no counterfactual scenarios".to_string()),
            threshold,
        };
    }

    let pc = prediction_consistency(baseline, counterfactuals);
    ConsistencyReport {
        prediction_consistency: pc,
        flagged: pc < threshold,
        reason: None,
        threshold,
    }
}

/// Re-run the prediction procedure across the scenario batch on scoped worker
/// threads. Scenarios are independent, so the batch fans out freely, but the
/// results are collected positionally and only returned once every worker has
/// finished: the aggregate score is computed behind a barrier, not streamed.
pub fn predict_batch<F>(scenarios: &[CounterfactualScenario], predict: F) -> Vec<Vec<f64>>
where
    F: Fn(&CounterfactualScenario) -> Vec<f64> + Sync,
{
    if scenarios.is_empty() {
        return Vec::new();
    }

    let workers = num_cpus::get().max(1).min(scenarios.len());
    let chunk_size = scenarios.len().div_ceil(workers);
    let predict = &predict;

    let mut results = Vec::with_capacity(scenarios.len());
    std::thread::scope(|scope| {
        let handles: Vec<_> = scenarios
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || chunk.iter().map(predict).collect::<Vec<_>>()))
            .collect();
        for handle in handles {
            results.extend(handle.join().expect("scenario worker panicked"));
        }
    });
    results
}
