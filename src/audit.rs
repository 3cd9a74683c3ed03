//! Append-only decision log.
//!
//! One JSONL record per terminal or retried transition, carrying the full
//! `WorkflowState` snapshot plus a timestamp. Records are never mutated or
//! deleted; `replay` reads the trail back for review tooling.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::logging::ts_now;
use crate::workflow::state::WorkflowState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub ts: String,
    /// "retry", "done", "failed", or "paused".
    pub kind: String,
    pub state: WorkflowState,
}

#[derive(Debug)]
pub struct DecisionLog {
    file: File,
}

impl DecisionLog {
    pub fn open(path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    pub fn append(&mut self, kind: &str, state: &WorkflowState) -> Result<(), PipelineError> {
        let record = AuditRecord {
            ts: ts_now(),
            kind: kind.to_string(),
            state: state.clone(),
        };
        let line = serde_json::to_string(&record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        Ok(())
    }

    /// Read the whole trail back. Unparseable lines are skipped rather than
    /// poisoning the replay.
    pub fn replay(path: &str) -> Result<Vec<AuditRecord>, PipelineError> {
        if !Path::new(path).exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(OpenOptions::new().read(true).open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(record) = serde_json::from_str::<AuditRecord>(&line) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_replay_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.jsonl");
        let path = path.to_str().unwrap();

        {
            let mut log = DecisionLog::open(path).unwrap();
            let mut state = WorkflowState::new("H1", 2);
            state.retry_count = 1;
            log.append("retry", &state).unwrap();
            state.failure_reason = Some("Max retries exceeded after critic veto.".to_string());
            log.append("failed", &state).unwrap();
        }

        let records = DecisionLog::replay(path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, "retry");
        assert_eq!(records[1].kind, "failed");
        assert_eq!(records[1].state.hypothesis, "H1");
        assert!(records[1].state.failure_reason.is_some());
    }

    #[test]
    fn test_append_only_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.jsonl");
        let path = path.to_str().unwrap();

        let state = WorkflowState::new("H", 0);
        DecisionLog::open(path).unwrap().append("paused", &state).unwrap();
        DecisionLog::open(path).unwrap().append("done", &state).unwrap();

        let records = DecisionLog::replay(path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, "paused");
        assert_eq!(records[1].kind, "done");
    }

    #[test]
    fn test_replay_missing_file_is_empty() {
        assert!(DecisionLog::replay("/nonexistent/decisions.jsonl")
            .unwrap()
            .is_empty());
    }
}
