//! Risk manager: fixed-limit checks on the executor's risk metrics. Any
//! breach fails the run; each violated metric is listed by name.

use serde::{Deserialize, Serialize};

use crate::analysis::RiskMetrics;
use crate::tools::CheckStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskLimits {
    pub max_drawdown: f64,
    pub exposure: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_drawdown: 0.2,
            exposure: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub status: CheckStatus,
    pub violations: Vec<String>,
    pub metrics: RiskMetrics,
    pub limits: RiskLimits,
}

pub fn evaluate(metrics: &RiskMetrics, limits: &RiskLimits) -> RiskReport {
    let mut violations = Vec::new();
    if metrics.max_drawdown > limits.max_drawdown {
        violations.push("max_drawdown".to_string());
    }
    if metrics.exposure > limits.exposure {
        violations.push("exposure".to_string());
    }

    RiskReport {
        status: if violations.is_empty() {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        },
        violations,
        metrics: *metrics,
        limits: *limits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_limits_passes() {
        let report = evaluate(
            &RiskMetrics {
                max_drawdown: 0.1,
                exposure: 0.8,
            },
            &RiskLimits::default(),
        );
        assert_eq!(report.status, CheckStatus::Pass);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_drawdown_breach_listed_by_name() {
        let report = evaluate(
            &RiskMetrics {
                max_drawdown: 0.25,
                exposure: 1.0,
            },
            &RiskLimits::default(),
        );
        assert_eq!(report.status, CheckStatus::Fail);
        assert_eq!(report.violations, vec!["max_drawdown".to_string()]);
    }

    #[test]
    fn test_both_breaches_listed() {
        let report = evaluate(
            &RiskMetrics {
                max_drawdown: 0.3,
                exposure: 1.5,
            },
            &RiskLimits::default(),
        );
        assert_eq!(
            report.violations,
            vec!["max_drawdown".to_string(), "exposure".to_string()]
        );
    }

    #[test]
    fn test_limits_are_inclusive() {
        // Exactly at the limit is not a breach.
        let report = evaluate(
            &RiskMetrics {
                max_drawdown: 0.2,
                exposure: 1.0,
            },
            &RiskLimits::default(),
        );
        assert_eq!(report.status, CheckStatus::Pass);
    }
}
