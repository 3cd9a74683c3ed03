//! Role policies: pure, stateless decision functions, each scoped to a fixed
//! allow-list of callable tools.
//!
//! Separation of powers is structural, not advisory: the executor has no veto
//! or approval authority because no such method exists on it, and a role that
//! reaches for a tool outside its list fails before the tool ever runs.

pub mod compliance;
pub mod critic;
pub mod executor;
pub mod planner;
pub mod risk;

use crate::error::PipelineError;
use crate::tools::Tool;

/// Static charter for a role: its name, mission, and tool allow-list.
#[derive(Debug, Clone, Copy)]
pub struct RoleProfile {
    pub name: &'static str,
    pub mission: &'static str,
    pub allowed_tools: &'static [Tool],
}

impl RoleProfile {
    /// Capability check. Runs before the tool executes, never after, so a
    /// misconfigured role cannot race its own permission failure.
    pub fn authorize(&self, tool: Tool) -> Result<(), PipelineError> {
        if self.allowed_tools.contains(&tool) {
            Ok(())
        } else {
            Err(PipelineError::ToolAccessViolation {
                role: self.name.to_string(),
                tool: tool.to_string(),
            })
        }
    }
}

pub const PLANNER: RoleProfile = RoleProfile {
    name: "planner",
    mission: "Decompose hypotheses into research steps. No data access.",
    allowed_tools: &[],
};

pub const EXECUTOR: RoleProfile = RoleProfile {
    name: "executor",
    mission: "Fetch and clean data, run analysis only. No evaluation or trading.",
    allowed_tools: &[Tool::FetchMarketData, Tool::CleanData, Tool::RunAnalysis],
};

pub const CRITIC: RoleProfile = RoleProfile {
    name: "critic",
    mission: "Evaluate for bias, leakage, and reproducibility. Can veto.",
    allowed_tools: &[],
};

pub const COMPLIANCE: RoleProfile = RoleProfile {
    name: "compliance",
    mission: "Check restricted symbols and wash-sale patterns. No modifications.",
    allowed_tools: &[Tool::CheckRestrictedSymbols, Tool::CheckWashSalePatterns],
};

pub const RISK_MANAGER: RoleProfile = RoleProfile {
    name: "risk_manager",
    mission: "Enforce max drawdown and exposure limits.",
    allowed_tools: &[],
};
