//! Error types for the research pipeline.
//!
//! Policy vetoes, operator pauses, and approval rejections are routing
//! outcomes, not errors: they travel through `WorkflowState` and the engine's
//! routing tables. Everything in [`PipelineError`] is a hard failure for the
//! current run and surfaces as the state's `failure_reason`.

use thiserror::Error;

use crate::workflow::state::WorkflowState;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A role invoked a tool outside its allow-list. The check runs before
    /// the tool ever executes; this is a configuration bug, always fatal.
    #[error("tool '{tool}' not allowed for role {role}")]
    ToolAccessViolation { role: String, tool: String },

    /// The market-data collaborator failed or returned nothing usable.
    /// Not retried by this core.
    #[error("market data error: {0}")]
    ExternalData(String),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),

    #[error("trace memory error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Terminal failure surfaced by the run entry point.
///
/// Carries the final state so callers can inspect the full audit trail of the
/// failed attempt. A non-null `failure_reason` is always an error to raise,
/// never a soft success.
#[derive(Debug, Error)]
#[error("workflow failed: {reason}")]
pub struct RunFailure {
    pub reason: String,
    pub state: Box<WorkflowState>,
}
