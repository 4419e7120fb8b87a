//! Addressing and handles for submitting jobs to another thread's loop.

use std::sync::Arc;
use std::thread::ThreadId;

use tracing::debug;

use crate::error::{RunLoopError, RunLoopResult};
use crate::job_queue::JobQueue;

/// Identifies the loop a job is submitted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThreadTarget {
    /// The loop owned by this OS thread.
    Id(ThreadId),
    /// The loop registered under this name.
    Name(String),
}

impl From<ThreadId> for ThreadTarget {
    fn from(id: ThreadId) -> Self {
        ThreadTarget::Id(id)
    }
}

impl From<&str> for ThreadTarget {
    fn from(name: &str) -> Self {
        ThreadTarget::Name(name.to_string())
    }
}

impl From<String> for ThreadTarget {
    fn from(name: String) -> Self {
        ThreadTarget::Name(name)
    }
}

impl From<&LoopHandle> for ThreadTarget {
    fn from(handle: &LoopHandle) -> Self {
        ThreadTarget::Id(handle.thread_id())
    }
}

impl std::fmt::Display for ThreadTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreadTarget::Id(id) => write!(f, "{:?}", id),
            ThreadTarget::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Cloneable, `Send` handle to one thread's loop.
///
/// Submitting through a handle skips the registry lookup. Once the owning
/// context is torn down every submission fails with
/// [`RunLoopError::UnknownThread`].
#[derive(Clone)]
pub struct LoopHandle {
    id: ThreadId,
    name: Arc<str>,
    queue: Arc<JobQueue>,
}

impl LoopHandle {
    pub(crate) fn new(id: ThreadId, name: &str, queue: Arc<JobQueue>) -> Self {
        Self {
            id,
            name: Arc::from(name),
            queue,
        }
    }

    /// Owner thread of the loop.
    pub fn thread_id(&self) -> ThreadId {
        self.id
    }

    /// Name the owner registered with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the owning context is still registered.
    pub fn is_alive(&self) -> bool {
        !self.queue.is_closed()
    }

    /// Queue `job` for the owner thread's next quantum.
    pub fn submit<F>(&self, job: F) -> RunLoopResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.queue.push(Box::new(job)) {
            debug!(target_thread = %self.name, "Job submitted");
            Ok(())
        } else {
            Err(RunLoopError::UnknownThread(self.name.to_string()))
        }
    }

    pub(crate) fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }
}

impl std::fmt::Debug for LoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("alive", &self.is_alive())
            .finish()
    }
}
