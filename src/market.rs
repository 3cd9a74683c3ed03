//! Market data: OHLCV types and the provider boundary.
//!
//! The pipeline never talks to a broker. Providers are read-only research
//! sources behind [`MarketDataProvider`]; the HTTP implementation speaks the
//! klines REST dialect, and [`SyntheticMarketData`] produces a seeded,
//! reproducible series for offline runs and tests.

use anyhow::Result;
use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OhlcvRow {
    pub ts: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalAction {
    Buy,
    Sell,
}

/// A buy/sell marker overlaid on the snapshot for dashboard visibility.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalMarker {
    pub ts: u64,
    pub price: f64,
    pub action: SignalAction,
}

/// The executor's view of the market: the cleaned window plus signal overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub interval: String,
    pub start_ts: u64,
    pub end_ts: u64,
    pub rows: Vec<OhlcvRow>,
    pub signals: Vec<SignalMarker>,
    /// SHA-256 over the row contents, for audit correlation.
    pub content_hash: String,
}

impl MarketSnapshot {
    pub fn new(
        symbol: &str,
        interval: &str,
        start_ts: u64,
        end_ts: u64,
        rows: Vec<OhlcvRow>,
        signals: Vec<SignalMarker>,
    ) -> Self {
        let content_hash = hash_rows(&rows);
        Self {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            start_ts,
            end_ts,
            rows,
            signals,
            content_hash,
        }
    }
}

/// Deterministic content hash of a row window.
pub fn hash_rows(rows: &[OhlcvRow]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        hasher.update(row.ts.to_le_bytes());
        hasher.update(row.open.to_le_bytes());
        hasher.update(row.high.to_le_bytes());
        hasher.update(row.low.to_le_bytes());
        hasher.update(row.close.to_le_bytes());
        hasher.update(row.volume.to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

pub fn interval_secs(interval: &str) -> u64 {
    match interval {
        "1m" => 60,
        "5m" => 300,
        "15m" => 900,
        "1h" => 3_600,
        "1d" => 86_400,
        _ => 86_400,
    }
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch OHLCV rows for `[start_ts, end_ts]` (epoch seconds). An empty
    /// window or an unreachable source is an [`PipelineError::ExternalData`].
    async fn fetch(
        &self,
        symbol: &str,
        start_ts: u64,
        end_ts: u64,
        interval: &str,
    ) -> std::result::Result<Vec<OhlcvRow>, PipelineError>;
}

/// Klines REST provider (Binance-compatible endpoint shape).
pub struct HttpMarketData {
    client: reqwest::Client,
    base: String,
}

impl HttpMarketData {
    pub fn new(base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_klines(
        &self,
        symbol: &str,
        start_ts: u64,
        end_ts: u64,
        interval: &str,
    ) -> Result<Vec<OhlcvRow>> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&startTime={}&endTime={}&limit=1000",
            self.base,
            symbol,
            interval,
            start_ts * 1000,
            end_ts * 1000
        );
        let raw: Vec<Vec<serde_json::Value>> =
            self.client.get(&url).send().await?.json().await?;

        let mut rows = Vec::with_capacity(raw.len());
        for k in raw {
            // kline array layout: [openTime, open, high, low, close, volume, ...]
            if k.len() < 6 {
                continue;
            }
            let ts = k[0].as_u64().unwrap_or(0) / 1000;
            let parse = |v: &serde_json::Value| -> Option<f64> {
                v.as_str().and_then(|s| s.parse().ok()).or_else(|| v.as_f64())
            };
            if let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
                parse(&k[1]),
                parse(&k[2]),
                parse(&k[3]),
                parse(&k[4]),
                parse(&k[5]),
            ) {
                rows.push(OhlcvRow {
                    ts,
                    open,
                    high,
                    low,
                    close,
                    volume,
                });
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl MarketDataProvider for HttpMarketData {
    async fn fetch(
        &self,
        symbol: &str,
        start_ts: u64,
        end_ts: u64,
        interval: &str,
    ) -> std::result::Result<Vec<OhlcvRow>, PipelineError> {
        let rows = self
            .fetch_klines(symbol, start_ts, end_ts, interval)
            .await
            .map_err(|err| PipelineError::ExternalData(format!("klines fetch failed: {err}")))?;
        if rows.is_empty() {
            return Err(PipelineError::ExternalData(format!(
                "no market data returned for {symbol}"
            )));
        }
        Ok(rows)
    }
}

/// Seeded random-walk provider. Same seed and window produce the same series,
/// which the audit trail depends on for offline runs.
pub struct SyntheticMarketData {
    seed: u64,
}

impl SyntheticMarketData {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

#[async_trait]
impl MarketDataProvider for SyntheticMarketData {
    async fn fetch(
        &self,
        symbol: &str,
        start_ts: u64,
        end_ts: u64,
        interval: &str,
    ) -> std::result::Result<Vec<OhlcvRow>, PipelineError> {
        if end_ts <= start_ts {
            return Err(PipelineError::ExternalData(format!(
                "empty window for {symbol}: {start_ts}..{end_ts}"
            )));
        }

        let step = interval_secs(interval);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut price = 40_000.0;
        let mut vol: f64 = 0.004;
        let mut rows = Vec::new();
        let mut ts = start_ts;
        let mut i = 0usize;
        while ts < end_ts {
            let regime_flip: f64 = rng.gen();
            if regime_flip < 0.02 {
                vol = (vol * 1.4).min(0.03);
            } else if regime_flip > 0.98 {
                vol = (vol * 0.7).max(0.001);
            }
            let drift = if i % 240 < 120 { 0.0004 } else { -0.0002 };
            let noise: f64 = rng.gen_range(-1.0..1.0) * vol;
            price = (price * (1.0 + drift + noise)).max(1.0);
            rows.push(OhlcvRow {
                ts,
                open: price * (1.0 - vol * 0.2),
                high: price * (1.0 + vol * 0.5),
                low: price * (1.0 - vol * 0.5),
                close: price,
                volume: rng.gen_range(50.0..200.0) * (1.0 + vol * 10.0),
            });
            ts += step;
            i += 1;
        }
        Ok(rows)
    }
}
