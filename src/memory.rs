//! Similarity memory for decision traces.
//!
//! Write-only from the engine's perspective: every terminal state is
//! summarized, embedded, and inserted. The embedding is a deterministic
//! hash-seeded vector — no external service, reproducible and auditable.
//! `retrieve_similar` exists for external review tooling.

use rand::{rngs::StdRng, SeedableRng};
use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};

use crate::error::PipelineError;
use crate::logging::ts_now;
use crate::validation::counterfactual::gaussian;
use crate::workflow::state::WorkflowState;

pub const EMBEDDING_DIM: usize = 64;

pub struct TraceMemory {
    conn: Connection,
}

#[derive(Debug, Clone)]
pub struct TraceHit {
    pub id: i64,
    pub created_at: String,
    pub hypothesis: String,
    pub summary: String,
    pub failure_reason: Option<String>,
    pub similarity: f64,
}

impl TraceMemory {
    pub fn open(path: &str) -> Result<Self, PipelineError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS decision_traces (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                kind TEXT NOT NULL,
                hypothesis TEXT NOT NULL,
                trace TEXT NOT NULL,
                summary TEXT NOT NULL,
                embedding BLOB NOT NULL,
                failure_reason TEXT
            );
            COMMIT;",
        )?;
        Ok(Self { conn })
    }

    pub fn store(&mut self, kind: &str, state: &WorkflowState) -> Result<(), PipelineError> {
        let summary = summarize(kind, state);
        let embedding = embed(&summary, EMBEDDING_DIM);
        let trace = serde_json::to_string(state)?;
        self.conn.execute(
            "INSERT INTO decision_traces
                (created_at, kind, hypothesis, trace, summary, embedding, failure_reason)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                ts_now(),
                kind,
                state.hypothesis,
                trace,
                summary,
                embedding_bytes(&embedding),
                state.failure_reason,
            ],
        )?;
        Ok(())
    }

    /// Cosine-similarity lookup over the stored traces.
    pub fn retrieve_similar(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<TraceHit>, PipelineError> {
        let query_vec = embed(query, EMBEDDING_DIM);
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, hypothesis, summary, embedding, failure_reason
             FROM decision_traces",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Vec<u8>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, created_at, hypothesis, summary, blob, failure_reason) = row?;
            let stored = bytes_embedding(&blob);
            hits.push(TraceHit {
                id,
                created_at,
                hypothesis,
                summary,
                failure_reason,
                similarity: cosine(&query_vec, &stored),
            });
        }
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }

    pub fn count(&self) -> Result<u64, PipelineError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM decision_traces", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Deterministic trace summary, built before embedding.
fn summarize(kind: &str, state: &WorkflowState) -> String {
    format!(
        "Hypothesis: {}. Terminal: {}. Stage: {}. Retries: {}. Failure: {}",
        state.hypothesis,
        kind,
        state.stage.as_str(),
        state.retry_count,
        state.failure_reason.as_deref().unwrap_or("none"),
    )
}

/// Hash-seeded unit vector: SHA-256 of the text seeds the generator, so the
/// same text always embeds identically.
pub fn embed(text: &str, dim: usize) -> Vec<f64> {
    let digest = Sha256::digest(text.as_bytes());
    let seed = u64::from_be_bytes(digest[..8].try_into().expect("digest shorter than 8 bytes"));
    let mut rng = StdRng::seed_from_u64(seed);
    let mut vec: Vec<f64> = (0..dim).map(|_| gaussian(&mut rng)).collect();
    let norm = vec.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in &mut vec {
            *v /= norm;
        }
    }
    vec
}

fn embedding_bytes(vec: &[f64]) -> Vec<u8> {
    vec.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_embedding(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes(c.try_into().expect("8-byte chunk")))
        .collect()
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f64 = a.iter().map(|v| v * v).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|v| v * v).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_deterministic_and_unit() {
        let a = embed("same text", EMBEDDING_DIM);
        let b = embed("same text", EMBEDDING_DIM);
        assert_eq!(a, b);
        let norm: f64 = a.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);

        let c = embed("different text", EMBEDDING_DIM);
        assert_ne!(a, c);
    }

    #[test]
    fn test_store_and_retrieve() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.sqlite");
        let mut memory = TraceMemory::open(path.to_str().unwrap()).unwrap();

        let mut failed = WorkflowState::new("momentum persists in bull markets", 2);
        failed.failure_reason = Some("Risk manager vetoed based on limits.".to_string());
        memory.store("failed", &failed).unwrap();

        let done = WorkflowState::new("RSI extremes revert", 2);
        memory.store("done", &done).unwrap();

        assert_eq!(memory.count().unwrap(), 2);

        let hits = memory
            .retrieve_similar(
                "Hypothesis: momentum persists in bull markets. Terminal: failed. \
                 Stage: planner. Retries: 0. Failure: Risk manager vetoed based on limits.",
                1,
            )
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].hypothesis, "momentum persists in bull markets");
        // Identical summary text embeds identically.
        assert!((hits[0].similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_embedding_blob_roundtrip() {
        let vec = embed("roundtrip", 16);
        let back = bytes_embedding(&embedding_bytes(&vec));
        assert_eq!(vec, back);
    }
}
