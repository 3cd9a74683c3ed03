//! The workflow engine: sequences role policies as nodes, applies routing
//! after the critic, risk, and approval stages, and enforces retry, pause,
//! and approval semantics.
//!
//! Control discipline:
//! - The pause gate runs before every node, so the operator kill-switch takes
//!   effect within one stage no matter where execution currently is.
//! - `failure_reason` is monotonic: once set, no node runs and nothing clears
//!   it. The only retry loop in the system is the bounded critic-veto loop.
//! - Every terminal exit and every retry transition funnels through one audit
//!   append before control returns to the caller.

use crate::audit::DecisionLog;
use crate::config::EngineConfig;
use crate::error::{PipelineError, RunFailure};
use crate::logging::{self, obj, v_num, v_str, Domain, Level};
use crate::market::MarketDataProvider;
use crate::memory::TraceMemory;
use crate::roles::{self, critic::CriticConfig, risk::RiskLimits};
use crate::signals::{ApprovalDecision, ControlSignals};
use crate::tools::CheckStatus;
use crate::workflow::state::{Stage, Terminal, WorkflowState};

pub const PAUSE_MARKER: &str = "Paused by operator.";
pub const MAX_RETRIES_REASON: &str = "Max retries exceeded after critic veto.";
pub const RISK_VETO_REASON: &str = "Risk manager vetoed based on limits.";
pub const APPROVAL_REJECT_REASON: &str = "Rejected by human approver.";

pub struct Engine {
    cfg: EngineConfig,
    provider: Box<dyn MarketDataProvider>,
    signals: Box<dyn ControlSignals>,
    audit: DecisionLog,
    memory: Option<TraceMemory>,
}

impl Engine {
    pub fn new(
        cfg: EngineConfig,
        provider: Box<dyn MarketDataProvider>,
        signals: Box<dyn ControlSignals>,
    ) -> Result<Self, PipelineError> {
        let audit = DecisionLog::open(&cfg.decision_log_path)?;
        let memory = match &cfg.memory_path {
            Some(path) => Some(TraceMemory::open(path)?),
            None => None,
        };
        Ok(Self {
            cfg,
            provider,
            signals,
            audit,
            memory,
        })
    }

    /// Run one hypothesis from scratch. Raises [`RunFailure`] when the
    /// terminal state carries a `failure_reason`; otherwise returns the
    /// terminal `done` or `paused` state.
    pub async fn run(
        &mut self,
        hypothesis: &str,
        max_retries: u32,
    ) -> Result<WorkflowState, RunFailure> {
        self.resume(WorkflowState::new(hypothesis, max_retries)).await
    }

    /// Re-enter a persisted run at its recorded stage. The terminal pause
    /// marker is cleared here; the live signal source decides whether the run
    /// is still paused.
    pub async fn resume(
        &mut self,
        mut state: WorkflowState,
    ) -> Result<WorkflowState, RunFailure> {
        state.pause_requested = false;
        let terminal = self.drive(&mut state).await;
        self.finalize(terminal, state)
    }

    async fn drive(&mut self, state: &mut WorkflowState) -> Terminal {
        loop {
            // Kill-switch first, before any node work.
            if self.signals.is_paused() {
                state.pause_requested = true;
                state.log(PAUSE_MARKER);
                return Terminal::Paused;
            }
            // Monotonic failure: nothing runs past a set reason.
            if state.failed() {
                return Terminal::Failed;
            }

            match state.stage {
                Stage::Planner => {
                    self.planner_node(state);
                    if !state.failed() {
                        state.stage = Stage::Executor;
                    }
                }
                Stage::Executor => {
                    self.executor_node(state).await;
                    if !state.failed() {
                        state.stage = Stage::Critic;
                    }
                }
                Stage::Critic => {
                    self.critic_node(state);
                    if !state.failed() {
                        self.route_after_critic(state);
                    }
                }
                Stage::Risk => {
                    self.risk_node(state);
                    if !state.failed() {
                        state.stage = Stage::Approval;
                    }
                }
                Stage::Approval => {
                    return self.approval_node(state);
                }
            }
        }
    }

    fn planner_node(&self, state: &mut WorkflowState) {
        state.active_node = Stage::Planner.as_str().to_string();
        state.plan = roles::planner::plan(&state.hypothesis);
        state.say(roles::PLANNER.name, "Plan created.");
        state.log("Planner produced research plan");
        logging::log(
            Level::Debug,
            Domain::Plan,
            "plan_created",
            obj(&[("steps", v_num(state.plan.len() as f64))]),
        );
    }

    async fn executor_node(&self, state: &mut WorkflowState) {
        state.active_node = Stage::Executor.as_str().to_string();
        let artifacts = roles::executor::execute(
            &roles::EXECUTOR,
            self.provider.as_ref(),
            &self.cfg,
            &state.plan,
        )
        .await;

        let artifacts = match artifacts {
            Ok(artifacts) => artifacts,
            Err(err) => {
                state.failure_reason = Some(err.to_string());
                state.log("Executor failed to assemble artifacts");
                return;
            }
        };

        state.say(roles::EXECUTOR.name, "Code generated (not executed).");
        state.log("Executor produced analysis artifacts");
        logging::log(
            Level::Debug,
            Domain::Exec,
            "artifacts",
            obj(&[
                ("rows", v_num(artifacts.snapshot.rows.len() as f64)),
                ("signals", v_num(artifacts.snapshot.signals.len() as f64)),
                ("snapshot_hash", v_str(&artifacts.snapshot.content_hash)),
            ]),
        );

        // Compliance review is informational and cannot modify the analysis
        // or gate routing; its report rides along for the audit trail.
        match roles::compliance::review(
            &roles::COMPLIANCE,
            &[self.cfg.symbol.clone()],
            &[],
            &self.cfg.restricted_symbols,
        ) {
            Ok(report) => {
                state.compliance_report = Some(report);
                state.log("Compliance review completed");
            }
            Err(err) => {
                // Allow-list violation is a configuration bug, always fatal.
                state.failure_reason = Some(err.to_string());
                return;
            }
        }

        state.artifacts = Some(artifacts);
    }

    fn critic_node(&self, state: &mut WorkflowState) {
        state.active_node = Stage::Critic.as_str().to_string();
        let Some(artifacts) = state.artifacts.as_ref() else {
            state.failure_reason = Some("Critic invoked without executor artifacts.".to_string());
            return;
        };

        let critic_cfg = CriticConfig {
            pc_threshold: self.cfg.pc_threshold,
            counterfactual: self.cfg.counterfactual(),
            seed: self.cfg.counterfactual_seed,
        };
        let report = roles::critic::evaluate(artifacts, &critic_cfg);

        state.confidence = report.confidence;
        state.critique_score = report.critique_score;
        state.say(roles::CRITIC.name, "Critic review complete.");
        state.log("Critic issued report");
        logging::log(
            Level::Debug,
            Domain::Critic,
            "report",
            obj(&[
                ("veto", serde_json::json!(report.veto)),
                ("critique_score", v_num(report.critique_score)),
                (
                    "prediction_consistency",
                    v_num(report.counterfactual.prediction_consistency),
                ),
            ]),
        );
        state.critic_report = Some(report);
    }

    fn route_after_critic(&mut self, state: &mut WorkflowState) {
        let veto = state
            .critic_report
            .as_ref()
            .map(|r| r.veto)
            .unwrap_or(true);
        if !veto {
            state.stage = Stage::Risk;
            return;
        }

        if state.retry_count < state.max_retries {
            state.retry_count += 1;
            state.log("Critic vetoed; retrying executor");
            logging::log_transition("critic", "executor", "veto_retry");
            self.audit_append("retry", state);
            state.stage = Stage::Executor;
        } else {
            state.failure_reason = Some(MAX_RETRIES_REASON.to_string());
        }
    }

    fn risk_node(&self, state: &mut WorkflowState) {
        state.active_node = Stage::Risk.as_str().to_string();
        let Some(artifacts) = state.artifacts.as_ref() else {
            state.failure_reason =
                Some("Risk manager invoked without executor artifacts.".to_string());
            return;
        };

        let limits = RiskLimits {
            max_drawdown: self.cfg.max_drawdown_limit,
            exposure: self.cfg.max_exposure_limit,
        };
        let report = roles::risk::evaluate(&artifacts.risk_metrics, &limits);
        state.say(roles::RISK_MANAGER.name, "Risk checks complete.");
        state.log("Risk manager issued report");

        let failed = report.status != CheckStatus::Pass;
        state.risk_report = Some(report);
        if failed {
            state.failure_reason = Some(RISK_VETO_REASON.to_string());
        }
    }

    fn approval_node(&self, state: &mut WorkflowState) -> Terminal {
        state.active_node = Stage::Approval.as_str().to_string();
        state.awaiting_approval = true;

        match self.signals.approval() {
            Some(ApprovalDecision::Approve) => {
                state.human_approval = true;
                state.awaiting_approval = false;
                state.say("human", "Approved.");
                state.log("Human approval granted");
                Terminal::Done
            }
            Some(ApprovalDecision::Reject) => {
                state.human_approval = false;
                state.awaiting_approval = false;
                state.failure_reason = Some(APPROVAL_REJECT_REASON.to_string());
                state.say("human", "Rejected.");
                state.log("Human approval rejected");
                Terminal::Failed
            }
            None => {
                // Logical suspension: the run halts and resumes by re-entry
                // with this state once a decision is present. No busy-poll.
                state.pause_requested = true;
                state.log("Awaiting human approval");
                Terminal::Paused
            }
        }
    }

    fn finalize(
        &mut self,
        terminal: Terminal,
        state: WorkflowState,
    ) -> Result<WorkflowState, RunFailure> {
        self.audit_append(terminal.as_str(), &state);
        if let Some(memory) = &mut self.memory {
            if let Err(err) = memory.store(terminal.as_str(), &state) {
                eprintln!("[memory] trace store failed: {err}");
            }
        }
        logging::log_terminal(
            terminal.as_str(),
            state.failure_reason.as_deref(),
            state.retry_count,
        );

        match state.failure_reason.clone() {
            Some(reason) => Err(RunFailure {
                reason,
                state: Box::new(state),
            }),
            None => Ok(state),
        }
    }

    fn audit_append(&mut self, kind: &str, state: &WorkflowState) {
        if let Err(err) = self.audit.append(kind, state) {
            // The audit sink must never mask the run outcome; surface loudly
            // and continue.
            eprintln!("[audit] append failed: {err}");
            logging::log(
                Level::Error,
                Domain::Audit,
                "append_failed",
                obj(&[("error", v_str(&err.to_string()))]),
            );
        }
    }
}
