//! Executor: fetches market data, cleans it, and runs analysis, exclusively
//! through its three allowed tools. Generates research code text but never
//! executes it, and holds no veto or approval authority.

use serde::{Deserialize, Serialize};

use crate::analysis::{self, AnalysisSummary, RiskMetrics};
use crate::config::EngineConfig;
use crate::error::PipelineError;
use crate::market::{MarketDataProvider, MarketSnapshot};
use crate::roles::RoleProfile;
use crate::tools::Tool;
use crate::validation::counterfactual::ResearchDataset;

/// Everything the executor hands downstream. The critic and risk manager read
/// from here and nowhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorArtifacts {
    pub plan: Vec<String>,
    /// Generated-but-not-executed research code text.
    pub code: String,
    pub snapshot: MarketSnapshot,
    pub summary: AnalysisSummary,
    pub risk_metrics: RiskMetrics,
    /// Baseline prediction vector for the counterfactual validator.
    pub predictions: Vec<f64>,
    /// Validator input derived from the cleaned window.
    pub dataset: ResearchDataset,
}

pub async fn execute(
    profile: &RoleProfile,
    provider: &dyn MarketDataProvider,
    cfg: &EngineConfig,
    plan: &[String],
) -> Result<ExecutorArtifacts, PipelineError> {
    profile.authorize(Tool::FetchMarketData)?;
    let rows = provider
        .fetch(&cfg.symbol, cfg.start_ts, cfg.end_ts, &cfg.interval)
        .await?;
    if rows.is_empty() {
        return Err(PipelineError::ExternalData(format!(
            "no market data returned for {}",
            cfg.symbol
        )));
    }

    profile.authorize(Tool::CleanData)?;
    let cleaned = analysis::clean(&rows);

    profile.authorize(Tool::RunAnalysis)?;
    let out = analysis::run_analysis(&cleaned);

    let code = render_research_code(&cfg.symbol, plan);
    let snapshot = MarketSnapshot::new(
        &cfg.symbol,
        &cfg.interval,
        cfg.start_ts,
        cfg.end_ts,
        cleaned,
        out.signals.clone(),
    );
    let dataset = ResearchDataset {
        prices: out.closes.clone(),
        event_dates: Vec::new(),
        sentiment: Vec::new(),
    };

    Ok(ExecutorArtifacts {
        plan: plan.to_vec(),
        code,
        snapshot,
        summary: out.summary,
        risk_metrics: out.risk_metrics,
        predictions: out.predictions,
        dataset,
    })
}

/// Render the research code the pipeline would hand to an analyst. The plan
/// is carried in the header so the critic reviews the full intent, not just
/// the mechanics.
fn render_research_code(symbol: &str, plan: &[String]) -> String {
    let mut out = String::from("// Generated research code. Review only; never executed here.\n");
    for (i, step) in plan.iter().enumerate() {
        out.push_str(&format!("// Step {}: {}\n", i + 1, step));
    }
    out.push_str(&format!(
        "\nfn run_research(window: &[OhlcvRow]) -> Research {{\n\
         \x20   let closes: Vec<f64> = window.iter().map(|r| r.close).collect();\n\
         \x20   let rsi = rolling_rsi(&closes, 14);\n\
         \x20   let stance = stance_from_rsi(&rsi, 30.0, 70.0);\n\
         \x20   Research {{ symbol: \"{symbol}\", rsi, stance }}\n\
         }}\n"
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::SyntheticMarketData;
    use crate::roles;

    fn cfg() -> EngineConfig {
        EngineConfig {
            start_ts: 0,
            end_ts: 86_400 * 60,
            interval: "1d".to_string(),
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_execute_assembles_artifacts() {
        let provider = SyntheticMarketData::new(17);
        let plan = crate::roles::planner::plan("RSI extremes revert");
        let artifacts = execute(&roles::EXECUTOR, &provider, &cfg(), &plan)
            .await
            .unwrap();

        assert_eq!(artifacts.plan.len(), 4);
        assert_eq!(artifacts.snapshot.rows.len(), 60);
        assert_eq!(artifacts.dataset.prices.len(), 60);
        assert!(!artifacts.predictions.is_empty());
        assert!(!artifacts.snapshot.content_hash.is_empty());
        assert!(artifacts.code.contains("rolling_rsi"));
    }

    #[tokio::test]
    async fn test_plan_text_flows_into_code_header() {
        let provider = SyntheticMarketData::new(17);
        let plan = crate::roles::planner::plan("buy the dip");
        let artifacts = execute(&roles::EXECUTOR, &provider, &cfg(), &plan)
            .await
            .unwrap();
        assert!(artifacts.code.contains("buy the dip"));
    }

    #[tokio::test]
    async fn test_wrong_profile_fails_before_fetch() {
        let provider = SyntheticMarketData::new(17);
        let err = execute(&roles::PLANNER, &provider, &cfg(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ToolAccessViolation { .. }));
    }
}
