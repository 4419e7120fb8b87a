//! Configuration for the RunLoop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-loop configuration, fixed at registration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLoopConfig {
    /// Name of the thread targeted by `submit_to_main`.
    #[serde(default = "default_main_thread_name")]
    pub main_thread_name: String,

    /// Upper bound on a single idle wait inside `run` (milliseconds).
    ///
    /// Submissions wake the loop immediately; this only bounds how long the
    /// loop sleeps without any notification.
    #[serde(default = "default_idle_wait_ms")]
    pub idle_wait_ms: u64,

    /// What to do when an initializer or job panics.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_main_thread_name() -> String {
    "main".to_string()
}

fn default_idle_wait_ms() -> u64 {
    1000
}

impl Default for RunLoopConfig {
    fn default() -> Self {
        Self {
            main_thread_name: default_main_thread_name(),
            idle_wait_ms: default_idle_wait_ms(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl RunLoopConfig {
    /// Get the idle wait as Duration.
    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms.max(1))
    }
}

/// Handling of a callback that panics inside a quantum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the quantum and report the failure to the caller of `step`/`run`.
    #[default]
    Abort,
    /// Log the failure and keep executing the quantum.
    LogAndContinue,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Abort => write!(f, "abort"),
            FailurePolicy::LogAndContinue => write!(f, "log_and_continue"),
        }
    }
}
