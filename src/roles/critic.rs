//! Critic: methodological review plus counterfactual robustness validation.
//!
//! Two gates feed one veto. The code-pattern scan catches look-ahead bias in
//! the generated research code; the counterfactual check catches predictions
//! that fall apart under perturbation. The statistical check can only
//! strengthen a veto, never override one into approval — intentionally
//! one-directional.

use serde::{Deserialize, Serialize};

use crate::analysis;
use crate::roles::executor::ExecutorArtifacts;
use crate::validation::consistency::{self, ConsistencyReport};
use crate::validation::counterfactual::{self, CounterfactualConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assessment {
    Unknown,
    Low,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticReport {
    pub look_ahead_risk: Assessment,
    pub overfitting: Assessment,
    pub leakage: Assessment,
    pub reproducibility: Assessment,
    pub veto: bool,
    pub confidence: f64,
    pub critique_score: f64,
    pub counterfactual: ConsistencyReport,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct CriticConfig {
    pub pc_threshold: f64,
    pub counterfactual: CounterfactualConfig,
    pub seed: u64,
}

impl Default for CriticConfig {
    fn default() -> Self {
        Self {
            pc_threshold: 0.7,
            counterfactual: CounterfactualConfig::default(),
            seed: 7,
        }
    }
}

const SCORE_CLEAN: f64 = 0.9;
const SCORE_SUSPECT: f64 = 0.4;
const VETO_BELOW: f64 = 0.8;

/// Negative future-offset indexing or the literal term "future" in generated
/// code reads as look-ahead bias.
fn scan_look_ahead(code: &str) -> Assessment {
    let lower = code.to_lowercase();
    if lower.contains("shift(-") || lower.contains("future") {
        Assessment::High
    } else {
        Assessment::Low
    }
}

pub fn evaluate(artifacts: &ExecutorArtifacts, cfg: &CriticConfig) -> CriticReport {
    let look_ahead_risk = scan_look_ahead(&artifacts.code);
    let critique_score = if look_ahead_risk == Assessment::Low {
        SCORE_CLEAN
    } else {
        SCORE_SUSPECT
    };
    let mut veto = critique_score < VETO_BELOW;
    let mut notes = String::from("Heuristic review completed.");

    // Counterfactual validation: re-run the same prediction procedure on each
    // perturbed scenario, then score sign agreement behind the batch barrier.
    let scenarios = counterfactual::generate(&artifacts.dataset, &cfg.counterfactual, cfg.seed);
    let cf_predictions = consistency::predict_batch(&scenarios, |s| analysis::predict(&s.prices));
    let report = consistency::score(&artifacts.predictions, &cf_predictions, cfg.pc_threshold);

    if report.prediction_consistency < cfg.pc_threshold {
        veto = true;
        notes.push_str(&format!(" PC below threshold {}.", cfg.pc_threshold));
    }

    CriticReport {
        look_ahead_risk,
        overfitting: Assessment::Unknown,
        leakage: Assessment::Unknown,
        reproducibility: Assessment::Unknown,
        veto,
        confidence: critique_score,
        critique_score,
        counterfactual: report,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketSnapshot;
    use crate::analysis::{AnalysisSummary, RiskMetrics};
    use crate::validation::counterfactual::ResearchDataset;

    fn artifacts(code: &str, prices: Vec<f64>) -> ExecutorArtifacts {
        let predictions = analysis::predict(&prices);
        ExecutorArtifacts {
            plan: vec!["step".to_string()],
            code: code.to_string(),
            snapshot: MarketSnapshot::new("TEST", "1d", 0, 0, Vec::new(), Vec::new()),
            summary: AnalysisSummary {
                rsi_last: 50.0,
                signal_count: 0,
            },
            risk_metrics: RiskMetrics {
                max_drawdown: 0.05,
                exposure: 1.0,
            },
            predictions,
            dataset: ResearchDataset {
                prices,
                event_dates: Vec::new(),
                sentiment: Vec::new(),
            },
        }
    }

    /// Trending series long enough for a stable RSI stance under small noise.
    fn stable_prices() -> Vec<f64> {
        (0..120).map(|i| 1_000.0 + 10.0 * i as f64).collect()
    }

    #[test]
    fn test_clean_code_passes() {
        let report = evaluate(&artifacts("let x = closes[i - 1];", stable_prices()), &CriticConfig::default());
        assert_eq!(report.look_ahead_risk, Assessment::Low);
        assert_eq!(report.critique_score, 0.9);
        assert!(report.counterfactual.prediction_consistency > 0.9);
        assert!(!report.veto);
    }

    #[test]
    fn test_shift_pattern_vetoes() {
        let report = evaluate(
            &artifacts("let y = series.shift(-1);", stable_prices()),
            &CriticConfig::default(),
        );
        assert_eq!(report.look_ahead_risk, Assessment::High);
        assert_eq!(report.critique_score, 0.4);
        assert!(report.veto);
    }

    #[test]
    fn test_future_term_vetoes_case_insensitive() {
        let report = evaluate(
            &artifacts("// uses FUTURE returns", stable_prices()),
            &CriticConfig::default(),
        );
        assert_eq!(report.look_ahead_risk, Assessment::High);
        assert!(report.veto);
    }

    #[test]
    fn test_low_consistency_forces_veto_on_clean_code() {
        // Noise far larger than the price scale shreds the RSI stance, so the
        // counterfactual gate fires even though the code scan is clean.
        let cfg = CriticConfig {
            counterfactual: CounterfactualConfig {
                scenarios: 20,
                price_noise_std: 1.0e6,
                earnings_shift_days: 0,
            },
            ..Default::default()
        };
        let report = evaluate(&artifacts("let x = 1;", stable_prices()), &cfg);
        assert_eq!(report.look_ahead_risk, Assessment::Low);
        assert!(report.veto);
        assert!(report.notes.contains("PC below threshold"));
    }

    #[test]
    fn test_strengthening_is_one_directional() {
        // Dirty code with a perfectly consistent counterfactual result still
        // vetoes: the statistical check never de-escalates.
        let report = evaluate(
            &artifacts("series.shift(-2)", stable_prices()),
            &CriticConfig::default(),
        );
        assert!(report.counterfactual.prediction_consistency > 0.9);
        assert!(report.veto);
    }

    #[test]
    fn test_empty_dataset_is_flagged_and_vetoed() {
        let report = evaluate(&artifacts("let x = 1;", Vec::new()), &CriticConfig::default());
        assert_eq!(report.counterfactual.prediction_consistency, 0.0);
        assert!(report.counterfactual.flagged);
        assert!(report.veto);
    }
}
