//! Context lifecycle, loop state and step outcome definitions.

use serde::{Deserialize, Serialize};

/// Lifecycle of the calling thread's context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextState {
    /// `register` has never been called on this thread.
    Uninitialized,
    /// Registered; loop and queueing operations are available.
    Active,
    /// Registered once, then torn down by `unregister`.
    TornDown,
}

impl std::fmt::Display for ContextState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextState::Uninitialized => write!(f, "uninitialized"),
            ContextState::Active => write!(f, "active"),
            ContextState::TornDown => write!(f, "torn_down"),
        }
    }
}

/// RunLoop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LoopState {
    /// Not inside `run` or `step`.
    Idle = 0,
    /// Executing a quantum, or parked inside `run`.
    Running = 1,
}

impl From<u8> for LoopState {
    fn from(v: u8) -> Self {
        match v {
            1 => LoopState::Running,
            _ => LoopState::Idle,
        }
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopState::Idle => write!(f, "idle"),
            LoopState::Running => write!(f, "running"),
        }
    }
}

/// Result of a single `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Work is still pending; call `step` again without sleeping.
    MoreWork,
    /// Nothing pending; safe to suspend until a submission arrives.
    WouldBlock,
}

impl StepOutcome {
    pub fn is_more_work(&self) -> bool {
        matches!(self, StepOutcome::MoreWork)
    }
}
