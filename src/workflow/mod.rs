//! The decision-workflow state machine.
//!
//! ```text
//! planner ──► executor ──► critic ──► risk ──► approval ──► done
//!                ▲           │         │          │
//!                └── retry ──┘         │          ├──► paused (resumable)
//!                (bounded)             └──────────┴──► failed
//! ```
//!
//! One `WorkflowState` is threaded through every stage; the engine owns the
//! routing, the retry budget, the pause gate, and the audit funnel.

pub mod engine;
pub mod state;

pub use engine::Engine;
pub use state::{Stage, Terminal, WorkflowState};
