//! Multiple-producer, single-consumer job queue with a wakeup condition.
//!
//! Producers on any thread push boxed closures; only the owner thread pops
//! them. Pushing notifies the condition variable so an owner parked in
//! [`JobQueue::wait`] resumes promptly.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::metrics::RunLoopMetrics;

/// A job submitted from any thread for execution on the owner thread.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

struct QueueInner {
    jobs: VecDeque<Job>,
    closed: bool,
}

/// FIFO job queue shared between producers and the owning loop.
pub(crate) struct JobQueue {
    inner: Mutex<QueueInner>,
    ready: Condvar,
    metrics: Arc<RunLoopMetrics>,
}

impl JobQueue {
    pub(crate) fn new(metrics: Arc<RunLoopMetrics>) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                jobs: VecDeque::new(),
                closed: false,
            }),
            ready: Condvar::new(),
            metrics,
        }
    }

    /// Append a job. Returns `false` (dropping the job) once the queue is closed.
    pub(crate) fn push(&self, job: Job) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed {
            return false;
        }
        inner.jobs.push_back(job);
        let depth = inner.jobs.len();
        drop(inner);

        self.metrics.record_job_submitted();
        self.ready.notify_one();
        trace!(depth, "Job enqueued");
        true
    }

    /// Take the oldest job, if any. Never blocks beyond the critical section.
    pub(crate) fn pop(&self) -> Option<Job> {
        self.inner.lock().jobs.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.lock().jobs.is_empty()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Park the caller until a job is queued, the queue closes, or `timeout`
    /// elapses. Returns whether a job is available.
    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        let mut inner = self.inner.lock();
        if inner.jobs.is_empty() && !inner.closed {
            self.ready.wait_for(&mut inner, timeout);
        }
        !inner.jobs.is_empty()
    }

    /// Reject further pushes and discard everything still queued.
    ///
    /// Returns the number of discarded jobs.
    pub(crate) fn close(&self) -> usize {
        let discarded = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            std::mem::take(&mut inner.jobs)
        };
        self.ready.notify_all();

        // Job destructors run outside the lock.
        let count = discarded.len();
        drop(discarded);
        self.metrics.record_dropped(count as u64);
        count
    }
}
