//! Tool registry and the capability axis for role policies.
//!
//! Every external capability a role can exercise is named here. Roles carry a
//! fixed allow-list of [`Tool`]s; the authorization check happens before a
//! tool executes, never after.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    FetchMarketData,
    CleanData,
    RunAnalysis,
    CheckRestrictedSymbols,
    CheckWashSalePatterns,
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tool::FetchMarketData => write!(f, "fetch_market_data"),
            Tool::CleanData => write!(f, "clean_data"),
            Tool::RunAnalysis => write!(f, "run_analysis"),
            Tool::CheckRestrictedSymbols => write!(f, "check_restricted_symbols"),
            Tool::CheckWashSalePatterns => write!(f, "check_wash_sale_patterns"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub tool: Tool,
    pub description: &'static str,
}

pub const ALL_TOOLS: &[ToolSpec] = &[
    ToolSpec {
        tool: Tool::FetchMarketData,
        description: "Read-only access to approved research data sources.",
    },
    ToolSpec {
        tool: Tool::CleanData,
        description: "Deterministic data normalization and cleaning.",
    },
    ToolSpec {
        tool: Tool::RunAnalysis,
        description: "Stateless research analysis routines.",
    },
    ToolSpec {
        tool: Tool::CheckRestrictedSymbols,
        description: "Compliance check for restricted tickers.",
    },
    ToolSpec {
        tool: Tool::CheckWashSalePatterns,
        description: "Compliance check for wash-sale patterns.",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
}

/// A trade record as compliance would see it. The pipeline is research-only,
/// so in practice this list is always empty; a populated one is a violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub side: String,
    pub qty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolReport {
    pub checked_symbols: Vec<String>,
    pub violations: Vec<String>,
    pub status: CheckStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeReport {
    pub trades_seen: usize,
    pub status: CheckStatus,
    pub note: String,
}

pub fn check_restricted_symbols(symbols: &[String], restricted: &[String]) -> SymbolReport {
    let violations: Vec<String> = symbols
        .iter()
        .filter(|s| restricted.iter().any(|r| r == *s))
        .cloned()
        .collect();
    SymbolReport {
        checked_symbols: symbols.to_vec(),
        status: if violations.is_empty() {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        },
        violations,
    }
}

/// Research-only invariant: any non-empty trade list is itself a violation.
pub fn check_wash_sale_patterns(trades: &[TradeRecord]) -> TradeReport {
    TradeReport {
        trades_seen: trades.len(),
        status: if trades.is_empty() {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        },
        note: "Research-only system should not include trade data.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde_names() {
        for spec in ALL_TOOLS {
            let json = serde_json::to_string(&spec.tool).unwrap();
            assert_eq!(json, format!("\"{}\"", spec.tool));
        }
    }

    #[test]
    fn test_restricted_symbols() {
        let restricted = vec!["BADCO".to_string()];
        let clean = check_restricted_symbols(&["BTCUSDT".to_string()], &restricted);
        assert_eq!(clean.status, CheckStatus::Pass);
        assert!(clean.violations.is_empty());

        let dirty = check_restricted_symbols(&["BADCO".to_string()], &restricted);
        assert_eq!(dirty.status, CheckStatus::Fail);
        assert_eq!(dirty.violations, vec!["BADCO".to_string()]);
    }

    #[test]
    fn test_any_trade_is_a_violation() {
        assert_eq!(check_wash_sale_patterns(&[]).status, CheckStatus::Pass);
        let trades = vec![TradeRecord {
            symbol: "BTCUSDT".to_string(),
            side: "buy".to_string(),
            qty: 1.0,
        }];
        assert_eq!(check_wash_sale_patterns(&trades).status, CheckStatus::Fail);
    }
}
