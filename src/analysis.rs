//! Deterministic research transforms: cleaning, RSI, signal markers, risk
//! metrics, and the baseline prediction procedure the critic re-runs on
//! counterfactual scenarios.
//!
//! Everything here is a pure function of its inputs. Nothing evaluates
//! strategy quality and nothing places trades.

use serde::{Deserialize, Serialize};

use crate::market::{OhlcvRow, SignalAction, SignalMarker};

pub const RSI_PERIOD: usize = 14;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub rsi_last: f64,
    pub signal_count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Peak-to-trough loss as a positive fraction of the peak.
    pub max_drawdown: f64,
    /// Notional exposure as a fraction of capital.
    pub exposure: f64,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub closes: Vec<f64>,
    pub rsi: Vec<f64>,
    pub signals: Vec<SignalMarker>,
    pub summary: AnalysisSummary,
    pub risk_metrics: RiskMetrics,
    pub predictions: Vec<f64>,
}

/// Normalize a raw window: time-ordered, deduplicated, finite values only.
pub fn clean(rows: &[OhlcvRow]) -> Vec<OhlcvRow> {
    let mut out: Vec<OhlcvRow> = rows
        .iter()
        .copied()
        .filter(|r| {
            r.open.is_finite()
                && r.high.is_finite()
                && r.low.is_finite()
                && r.close.is_finite()
                && r.volume.is_finite()
        })
        .collect();
    out.sort_by_key(|r| r.ts);
    out.dedup_by_key(|r| r.ts);
    out
}

/// Rolling-mean RSI. Warmup slots are NaN; callers treat NaN as "no signal".
pub fn rolling_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let mut rsi = vec![f64::NAN; closes.len()];
    if closes.len() <= period || period == 0 {
        return rsi;
    }

    let mut gains = vec![0.0; closes.len()];
    let mut losses = vec![0.0; closes.len()];
    for i in 1..closes.len() {
        let delta = closes[i] - closes[i - 1];
        if delta > 0.0 {
            gains[i] = delta;
        } else {
            losses[i] = -delta;
        }
    }

    for i in period..closes.len() {
        let window = (i - period + 1)..=i;
        let avg_gain: f64 = window.clone().map(|j| gains[j]).sum::<f64>() / period as f64;
        let avg_loss: f64 = window.map(|j| losses[j]).sum::<f64>() / period as f64;
        rsi[i] = if avg_loss < 1e-12 {
            if avg_gain < 1e-12 {
                50.0
            } else {
                100.0
            }
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
    }
    rsi
}

/// Map RSI values to a stance vector: +1 oversold (buy), -1 overbought
/// (sell), 0 flat. Warmup bars are skipped, so equal-length price inputs
/// always yield equal-length stance vectors.
pub fn stance_from_rsi(rsi: &[f64]) -> Vec<f64> {
    rsi.iter()
        .filter(|v| !v.is_nan())
        .map(|v| {
            if *v < RSI_OVERSOLD {
                1.0
            } else if *v > RSI_OVERBOUGHT {
                -1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// The baseline prediction procedure. The critic re-runs this exact function
/// on every counterfactual scenario.
pub fn predict(prices: &[f64]) -> Vec<f64> {
    stance_from_rsi(&rolling_rsi(prices, RSI_PERIOD))
}

/// Peak-to-trough drawdown as a positive fraction.
pub fn max_drawdown(closes: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0f64;
    for &c in closes {
        peak = peak.max(c);
        if peak > 0.0 {
            worst = worst.max((peak - c) / peak);
        }
    }
    worst
}

/// Run the full research analysis over a cleaned window.
pub fn run_analysis(rows: &[OhlcvRow]) -> AnalysisOutput {
    let closes: Vec<f64> = rows.iter().map(|r| r.close).collect();
    let rsi = rolling_rsi(&closes, RSI_PERIOD);

    let mut signals = Vec::new();
    for (row, value) in rows.iter().zip(rsi.iter()) {
        if value.is_nan() {
            continue;
        }
        if *value < RSI_OVERSOLD {
            signals.push(SignalMarker {
                ts: row.ts,
                price: row.close,
                action: SignalAction::Buy,
            });
        } else if *value > RSI_OVERBOUGHT {
            signals.push(SignalMarker {
                ts: row.ts,
                price: row.close,
                action: SignalAction::Sell,
            });
        }
    }

    let rsi_last = rsi
        .iter()
        .rev()
        .find(|v| !v.is_nan())
        .copied()
        .unwrap_or(f64::NAN);

    let summary = AnalysisSummary {
        rsi_last,
        signal_count: signals.len(),
    };
    let risk_metrics = RiskMetrics {
        max_drawdown: max_drawdown(&closes),
        // Research assumption: the hypothetical book is fully invested.
        exposure: 1.0,
    };
    let predictions = stance_from_rsi(&rsi);

    AnalysisOutput {
        closes,
        rsi,
        signals,
        summary,
        risk_metrics,
        predictions,
    }
}
