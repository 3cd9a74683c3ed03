//! Compliance officer: restricted-symbol and wash-sale checks.
//!
//! Informational only — the verdict rides along in the state for the audit
//! trail but never gates routing and never touches `failure_reason`.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::roles::RoleProfile;
use crate::tools::{self, CheckStatus, SymbolReport, Tool, TradeRecord, TradeReport};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub symbol_report: SymbolReport,
    pub wash_sale_report: TradeReport,
    pub status: CheckStatus,
}

pub fn review(
    profile: &RoleProfile,
    symbols: &[String],
    trades: &[TradeRecord],
    restricted: &[String],
) -> Result<ComplianceReport, PipelineError> {
    profile.authorize(Tool::CheckRestrictedSymbols)?;
    let symbol_report = tools::check_restricted_symbols(symbols, restricted);

    profile.authorize(Tool::CheckWashSalePatterns)?;
    let wash_sale_report = tools::check_wash_sale_patterns(trades);

    let status = if symbol_report.status == CheckStatus::Pass
        && wash_sale_report.status == CheckStatus::Pass
    {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };

    Ok(ComplianceReport {
        symbol_report,
        wash_sale_report,
        status,
    })
}
