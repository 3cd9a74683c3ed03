//! Shared workflow state.
//!
//! The state is intentionally explicit and auditable: it serializes in full
//! into every audit record, and a paused run resumes from nothing but this
//! struct. Any new field must keep that property.

use serde::{Deserialize, Serialize};

use crate::roles::compliance::ComplianceReport;
use crate::roles::critic::CriticReport;
use crate::roles::executor::ExecutorArtifacts;
use crate::roles::risk::RiskReport;

/// The node the engine will execute next. Persisted so a paused run re-enters
/// at the same logical stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Planner,
    Executor,
    Critic,
    Risk,
    Approval,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Planner => "planner",
            Stage::Executor => "executor",
            Stage::Critic => "critic",
            Stage::Risk => "risk",
            Stage::Approval => "approval",
        }
    }
}

/// Terminal routing outcomes. Mutually exclusive; the engine halts on any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terminal {
    Done,
    Failed,
    Paused,
}

impl Terminal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Terminal::Done => "done",
            Terminal::Failed => "failed",
            Terminal::Paused => "paused",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub hypothesis: String,
    pub stage: Stage,
    pub plan: Vec<String>,
    pub artifacts: Option<ExecutorArtifacts>,
    pub critic_report: Option<CriticReport>,
    pub compliance_report: Option<ComplianceReport>,
    pub risk_report: Option<RiskReport>,
    pub confidence: f64,
    pub critique_score: f64,
    pub retry_count: u32,
    pub max_retries: u32,
    pub pause_requested: bool,
    pub human_approval: bool,
    pub awaiting_approval: bool,
    /// Monotonic: once set, the run is terminal-failed and no further stage
    /// may run or clear it.
    pub failure_reason: Option<String>,
    /// Append-only transcript of stage messages.
    pub messages: Vec<Message>,
    /// Append-only internal trace.
    pub logs: Vec<String>,
    /// Stage currently executing, for external observability.
    pub active_node: String,
}

impl WorkflowState {
    pub fn new(hypothesis: &str, max_retries: u32) -> Self {
        let mut state = Self {
            hypothesis: hypothesis.to_string(),
            stage: Stage::Planner,
            plan: Vec::new(),
            artifacts: None,
            critic_report: None,
            compliance_report: None,
            risk_report: None,
            confidence: 0.0,
            critique_score: 0.0,
            retry_count: 0,
            max_retries,
            pause_requested: false,
            human_approval: false,
            awaiting_approval: false,
            failure_reason: None,
            messages: Vec::new(),
            logs: Vec::new(),
            active_node: String::new(),
        };
        state.say("user", hypothesis);
        state
    }

    pub fn log(&mut self, message: &str) {
        self.logs.push(message.to_string());
    }

    pub fn say(&mut self, role: &str, content: &str) {
        self.messages.push(Message {
            role: role.to_string(),
            content: content.to_string(),
        });
    }

    pub fn failed(&self) -> bool {
        self.failure_reason.is_some()
    }
}
