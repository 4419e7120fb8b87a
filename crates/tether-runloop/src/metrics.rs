//! RunLoop metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters for one loop.
///
/// Producers touch `jobs_submitted` from any thread; every other counter is
/// only written by the owner thread.
#[derive(Debug, Default)]
pub struct RunLoopMetrics {
    /// Total number of quanta executed.
    pub quanta: AtomicU64,

    /// Total component initializers executed.
    pub initializers_run: AtomicU64,

    /// Total jobs accepted into the queue.
    pub jobs_submitted: AtomicU64,

    /// Total jobs executed.
    pub jobs_run: AtomicU64,

    /// Jobs and initializers discarded at teardown.
    pub dropped: AtomicU64,

    /// Callbacks that panicked.
    pub failures: AtomicU64,

    /// Number of times `run` woke up from an idle wait.
    pub wakeups: AtomicU64,

    /// Total time spent waiting (microseconds).
    pub wait_time_us: AtomicU64,

    /// Start time.
    start_time: parking_lot::RwLock<Option<Instant>>,
}

impl RunLoopMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the first time the loop starts servicing.
    pub fn mark_start(&self) {
        let mut start = self.start_time.write();
        if start.is_none() {
            *start = Some(Instant::now());
        }
    }

    /// Get uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time
            .read()
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0)
    }

    pub fn record_quantum(&self) {
        self.quanta.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_initializer(&self) {
        self.initializers_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_submitted(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_run(&self) {
        self.jobs_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, count: u64) {
        self.dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a wakeup and the time spent waiting for it.
    pub fn record_wakeup(&self, waited_us: u64) {
        self.wakeups.fetch_add(1, Ordering::Relaxed);
        self.wait_time_us.fetch_add(waited_us, Ordering::Relaxed);
    }

    /// Get a snapshot of the metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            uptime_secs: self.uptime_secs(),
            quanta: self.quanta.load(Ordering::Relaxed),
            initializers_run: self.initializers_run.load(Ordering::Relaxed),
            jobs_submitted: self.jobs_submitted.load(Ordering::Relaxed),
            jobs_run: self.jobs_run.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            wakeups: self.wakeups.load(Ordering::Relaxed),
            wait_time_us: self.wait_time_us.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RunLoopMetrics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
    pub quanta: u64,
    pub initializers_run: u64,
    pub jobs_submitted: u64,
    pub jobs_run: u64,
    pub dropped: u64,
    pub failures: u64,
    pub wakeups: u64,
    pub wait_time_us: u64,
}

impl MetricsSnapshot {
    /// Jobs accepted but not yet executed (or dropped).
    pub fn jobs_pending(&self) -> u64 {
        self.jobs_submitted.saturating_sub(self.jobs_run)
    }

    /// Calculate average wait time in milliseconds.
    pub fn avg_wait_time_ms(&self) -> f64 {
        if self.wakeups == 0 {
            return 0.0;
        }
        (self.wait_time_us as f64 / self.wakeups as f64) / 1000.0
    }

    /// Calculate jobs executed per quantum.
    pub fn jobs_per_quantum(&self) -> f64 {
        if self.quanta == 0 {
            return 0.0;
        }
        self.jobs_run as f64 / self.quanta as f64
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
