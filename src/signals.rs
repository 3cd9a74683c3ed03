//! Operator control signals: pause kill-switch and the human approval gate.
//!
//! The engine never reads the filesystem or environment directly for control
//! flow; it queries an injected [`ControlSignals`] source. Production uses
//! [`FileSignals`] (sentinel files an operator can touch and remove); tests
//! use [`StaticSignals`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// The human decision read by the approval stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

pub trait ControlSignals: Send + Sync {
    /// Checked by the engine before every node; true halts the run at the
    /// next node boundary.
    fn is_paused(&self) -> bool;

    /// Read only by the approval node. `None` means no decision yet.
    fn approval(&self) -> Option<ApprovalDecision>;
}

/// Callers that need to flip signals while an engine holds the source can
/// share it behind an `Arc`.
impl<T: ControlSignals + ?Sized> ControlSignals for std::sync::Arc<T> {
    fn is_paused(&self) -> bool {
        (**self).is_paused()
    }

    fn approval(&self) -> Option<ApprovalDecision> {
        (**self).approval()
    }
}

/// File-based signals: pause while the sentinel exists; the approval file
/// holds "approve" or "reject".
pub struct FileSignals {
    pause_flag: PathBuf,
    approval_flag: PathBuf,
}

impl FileSignals {
    pub fn new(pause_flag: &str, approval_flag: &str) -> Self {
        Self {
            pause_flag: PathBuf::from(pause_flag),
            approval_flag: PathBuf::from(approval_flag),
        }
    }
}

impl ControlSignals for FileSignals {
    fn is_paused(&self) -> bool {
        self.pause_flag.exists()
    }

    fn approval(&self) -> Option<ApprovalDecision> {
        let raw = std::fs::read_to_string(&self.approval_flag).ok()?;
        match raw.trim().to_lowercase().as_str() {
            "approve" => Some(ApprovalDecision::Approve),
            "reject" => Some(ApprovalDecision::Reject),
            _ => None,
        }
    }
}

/// In-memory signals for tests and embedded callers.
#[derive(Default)]
pub struct StaticSignals {
    paused: AtomicBool,
    approval: Mutex<Option<ApprovalDecision>>,
}

impl StaticSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paused(paused: bool) -> Self {
        let signals = Self::default();
        signals.set_paused(paused);
        signals
    }

    pub fn with_approval(decision: ApprovalDecision) -> Self {
        let signals = Self::default();
        signals.set_approval(Some(decision));
        signals
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn set_approval(&self, decision: Option<ApprovalDecision>) {
        *self.approval.lock().expect("approval lock poisoned") = decision;
    }
}

impl ControlSignals for StaticSignals {
    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn approval(&self) -> Option<ApprovalDecision> {
        *self.approval.lock().expect("approval lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_static_signals_roundtrip() {
        let signals = StaticSignals::new();
        assert!(!signals.is_paused());
        assert_eq!(signals.approval(), None);

        signals.set_paused(true);
        signals.set_approval(Some(ApprovalDecision::Reject));
        assert!(signals.is_paused());
        assert_eq!(signals.approval(), Some(ApprovalDecision::Reject));
    }

    #[test]
    fn test_file_signals_pause_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let pause = dir.path().join("pause");
        let approval = dir.path().join("approval");
        let signals = FileSignals::new(pause.to_str().unwrap(), approval.to_str().unwrap());

        assert!(!signals.is_paused());
        fs::write(&pause, "").unwrap();
        assert!(signals.is_paused());
    }

    #[test]
    fn test_file_signals_approval_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let approval = dir.path().join("approval");
        let signals = FileSignals::new("/nonexistent/pause", approval.to_str().unwrap());

        assert_eq!(signals.approval(), None);
        fs::write(&approval, "APPROVE\n").unwrap();
        assert_eq!(signals.approval(), Some(ApprovalDecision::Approve));
        fs::write(&approval, "reject").unwrap();
        assert_eq!(signals.approval(), Some(ApprovalDecision::Reject));
        fs::write(&approval, "maybe").unwrap();
        assert_eq!(signals.approval(), None);
    }
}
