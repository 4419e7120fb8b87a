//! Error types for the RunLoop module.

use thiserror::Error;

/// Errors that can occur while registering threads or driving a loop.
#[derive(Debug, Error)]
pub enum RunLoopError {
    /// The calling thread already holds an active context.
    #[error("Thread is already registered as '{name}'")]
    AlreadyRegistered { name: String },

    /// The calling thread has no active context.
    #[error("Thread is not registered with the runtime")]
    NotRegistered,

    /// No registered context matches the submission target.
    #[error("Unknown thread: {0}")]
    UnknownThread(String),

    /// Another live thread holds the requested name.
    #[error("Thread name already in use: {0}")]
    NameInUse(String),

    /// `run` or `step` was invoked from inside a callback of the same loop.
    #[error("RunLoop is already running on this thread")]
    AlreadyRunning,

    /// An initializer or job panicked while the loop was executing it.
    #[error("{kind} panicked: {message}")]
    CallbackPanicked {
        kind: CallbackKind,
        message: String,
    },
}

/// Which queue a failed callback came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    Initializer,
    Job,
}

impl std::fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackKind::Initializer => write!(f, "Component initializer"),
            CallbackKind::Job => write!(f, "Job"),
        }
    }
}

/// Result type for RunLoop operations.
pub type RunLoopResult<T> = Result<T, RunLoopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_registered_display() {
        let err = RunLoopError::AlreadyRegistered {
            name: "main".to_string(),
        };
        assert!(err.to_string().contains("main"));
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_unknown_thread_display() {
        let err = RunLoopError::UnknownThread("worker".to_string());
        assert_eq!(err.to_string(), "Unknown thread: worker");
    }

    #[test]
    fn test_callback_panicked_display() {
        let err = RunLoopError::CallbackPanicked {
            kind: CallbackKind::Job,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Job panicked: boom");

        let err = RunLoopError::CallbackPanicked {
            kind: CallbackKind::Initializer,
            message: "bad init".to_string(),
        };
        assert!(err.to_string().starts_with("Component initializer"));
    }

    #[test]
    fn test_error_debug() {
        let err = RunLoopError::NotRegistered;
        assert!(format!("{:?}", err).contains("NotRegistered"));
    }
}
