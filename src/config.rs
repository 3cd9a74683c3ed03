//! Explicit engine configuration.
//!
//! Everything the pipeline used to pick up implicitly (thresholds, retry
//! limits, flag-file paths) lives in one struct handed to the engine at
//! construction. `from_env` exists for the binaries; tests build the struct
//! directly.

use crate::validation::counterfactual::CounterfactualConfig;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Research symbol for the executor's data request.
    pub symbol: String,
    /// Candle interval for the data request ("1d", "1h", "5m", "1m").
    pub interval: String,
    /// Research window, epoch seconds.
    pub start_ts: u64,
    pub end_ts: u64,

    /// Bounded critic-veto retry budget.
    pub max_retries: u32,
    /// Prediction-consistency threshold below which the critic forces a veto.
    pub pc_threshold: f64,

    /// Counterfactual perturbation parameters.
    pub scenarios: usize,
    pub price_noise_std: f64,
    pub earnings_shift_days: i64,
    pub counterfactual_seed: u64,

    /// Risk limits enforced by the risk manager.
    pub max_drawdown_limit: f64,
    pub max_exposure_limit: f64,

    /// Compliance: restricted symbol list.
    pub restricted_symbols: Vec<String>,

    /// Operator signal files (sentinel = paused; approval file holds the decision).
    pub pause_flag: String,
    pub approval_flag: String,

    /// Append-only decision log path.
    pub decision_log_path: String,
    /// Similarity memory store; `None` disables the write.
    pub memory_path: Option<String>,

    /// Base URL for the HTTP market-data provider.
    pub data_base_url: String,
    /// Seed for the synthetic provider.
    pub data_seed: u64,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            symbol: std::env::var("SYMBOL").unwrap_or_else(|_| "BTCUSDT".to_string()),
            interval: std::env::var("INTERVAL").unwrap_or_else(|_| "1d".to_string()),
            start_ts: env_parse("START_TS", 1_640_995_200), // 2022-01-01
            end_ts: env_parse("END_TS", 1_672_444_800),     // 2022-12-31
            max_retries: env_parse("MAX_RETRIES", 2),
            pc_threshold: env_parse("PC_THRESHOLD", 0.7),
            scenarios: env_parse("CF_SCENARIOS", 50),
            price_noise_std: env_parse("CF_NOISE_STD", 0.01),
            earnings_shift_days: env_parse("CF_SHIFT_DAYS", 3),
            counterfactual_seed: env_parse("CF_SEED", 7),
            max_drawdown_limit: env_parse("MAX_DRAWDOWN", 0.2),
            max_exposure_limit: env_parse("MAX_EXPOSURE", 1.0),
            restricted_symbols: std::env::var("RESTRICTED_SYMBOLS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            pause_flag: std::env::var("PAUSE_FLAG").unwrap_or_else(|_| "/tmp/factfin-pause".to_string()),
            approval_flag: std::env::var("APPROVAL_FLAG")
                .unwrap_or_else(|_| "/tmp/factfin-approval".to_string()),
            decision_log_path: std::env::var("DECISION_LOG")
                .unwrap_or_else(|_| "./decisions.jsonl".to_string()),
            memory_path: match std::env::var("MEMORY_DB") {
                Ok(v) if v.is_empty() || v == "off" => None,
                Ok(v) => Some(v),
                Err(_) => Some("./factfin.sqlite".to_string()),
            },
            data_base_url: std::env::var("DATA_BASE")
                .unwrap_or_else(|_| "https://api.binance.com".to_string()),
            data_seed: env_parse("DATA_SEED", 17),
        }
    }

    pub fn counterfactual(&self) -> CounterfactualConfig {
        CounterfactualConfig {
            scenarios: self.scenarios,
            price_noise_std: self.price_noise_std,
            earnings_shift_days: self.earnings_shift_days,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval: "1d".to_string(),
            start_ts: 1_640_995_200,
            end_ts: 1_672_444_800,
            max_retries: 2,
            pc_threshold: 0.7,
            scenarios: 50,
            price_noise_std: 0.01,
            earnings_shift_days: 3,
            counterfactual_seed: 7,
            max_drawdown_limit: 0.2,
            max_exposure_limit: 1.0,
            restricted_symbols: Vec::new(),
            pause_flag: "/tmp/factfin-pause".to_string(),
            approval_flag: "/tmp/factfin-approval".to_string(),
            decision_log_path: "./decisions.jsonl".to_string(),
            memory_path: Some("./factfin.sqlite".to_string()),
            data_base_url: "https://api.binance.com".to_string(),
            data_seed: 17,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_match_policy() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_drawdown_limit, 0.2);
        assert_eq!(cfg.max_exposure_limit, 1.0);
        assert_eq!(cfg.pc_threshold, 0.7);
    }

    #[test]
    fn test_counterfactual_view() {
        let cfg = EngineConfig {
            scenarios: 12,
            price_noise_std: 0.05,
            earnings_shift_days: 1,
            ..EngineConfig::default()
        };
        let cf = cfg.counterfactual();
        assert_eq!(cf.scenarios, 12);
        assert_eq!(cf.price_noise_std, 0.05);
        assert_eq!(cf.earnings_shift_days, 1);
    }
}
