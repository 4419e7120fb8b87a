//! Thread-local registration of loop-owning threads.
//!
//! Each participating OS thread holds at most one [`ThreadContext`] in
//! thread-local storage. The context owns the thread's [`EventLoop`]; tearing
//! the context down (explicitly via [`unregister`] or implicitly when the
//! thread exits) withdraws the loop from the registry and drops any work it
//! never delivered.

use std::cell::{Cell, RefCell};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use tracing::{info, warn};

use crate::config::RunLoopConfig;
use crate::error::{RunLoopError, RunLoopResult};
use crate::event_loop::EventLoop;
use crate::handle::{LoopHandle, ThreadTarget};
use crate::job_queue::JobQueue;
use crate::metrics::RunLoopMetrics;
use crate::registry::registry;
use crate::state::ContextState;

thread_local! {
    /// The calling thread's context, if registered.
    static CURRENT: RefCell<Option<ThreadContext>> = const { RefCell::new(None) };

    /// Set by `unregister`, cleared by the next `register`.
    static TORN_DOWN: Cell<bool> = const { Cell::new(false) };
}

/// Runtime state owned by one registered thread.
pub(crate) struct ThreadContext {
    id: ThreadId,
    name: String,
    torn_down: bool,
    pub(crate) event_loop: EventLoop,
}

impl ThreadContext {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Withdraw the loop from the registry and discard its pending work.
    ///
    /// Returns the number of discarded items, or `None` if already torn down.
    /// Emits no events: it also runs from the thread-local destructor, where
    /// a subscriber's own thread-locals may already be gone.
    fn teardown(&mut self) -> Option<usize> {
        if self.torn_down {
            return None;
        }
        self.torn_down = true;
        registry().remove(self.id, &self.name);
        Some(self.event_loop.teardown())
    }
}

impl Drop for ThreadContext {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Register the calling thread with the default loop configuration.
///
/// Returns a handle other threads can use to submit jobs to this thread.
pub fn register(name: impl Into<String>) -> RunLoopResult<LoopHandle> {
    register_with_config(name, RunLoopConfig::default())
}

/// Register the calling thread.
///
/// Fails with [`RunLoopError::AlreadyRegistered`] if the thread already holds
/// an active context, or [`RunLoopError::NameInUse`] if another live thread
/// registered the same name.
pub fn register_with_config(
    name: impl Into<String>,
    config: RunLoopConfig,
) -> RunLoopResult<LoopHandle> {
    let name = name.into();

    let handle = CURRENT
        .try_with(|current| {
            let mut current = current.borrow_mut();
            if let Some(existing) = current.as_ref() {
                return Err(RunLoopError::AlreadyRegistered {
                    name: existing.name.clone(),
                });
            }

            let id = thread::current().id();
            let metrics = Arc::new(RunLoopMetrics::new());
            let queue = Arc::new(JobQueue::new(metrics.clone()));
            let handle = LoopHandle::new(id, &name, queue);

            let is_main = name == config.main_thread_name;
            registry().insert(handle.clone(), is_main)?;

            *current = Some(ThreadContext {
                id,
                name: name.clone(),
                torn_down: false,
                event_loop: EventLoop::new(handle.clone(), config, metrics),
            });
            Ok(handle)
        })
        .map_err(|_| RunLoopError::NotRegistered)??;

    let _ = TORN_DOWN.try_with(|torn_down| torn_down.set(false));
    info!(thread = %name, "Thread registered");
    Ok(handle)
}

/// Tear down the calling thread's context.
///
/// Undelivered jobs and initializers are discarded, not drained.
pub fn unregister() -> RunLoopResult<()> {
    let mut context = CURRENT
        .try_with(|current| current.borrow_mut().take())
        .ok()
        .flatten()
        .ok_or(RunLoopError::NotRegistered)?;

    let _ = TORN_DOWN.try_with(|torn_down| torn_down.set(true));

    // Teardown runs outside the borrow so destructors of discarded
    // callbacks may touch the (now empty) context.
    let dropped = context.teardown().unwrap_or(0);
    if dropped > 0 {
        warn!(
            thread = %context.name,
            dropped,
            "Discarded undelivered work at teardown"
        );
    }
    info!(thread = %context.name, "Thread context torn down");
    Ok(())
}

/// Lifecycle state of the calling thread. Never fails.
pub fn context_state() -> ContextState {
    let active = CURRENT
        .try_with(|current| {
            current
                .try_borrow()
                .map(|current| current.is_some())
                .unwrap_or(true)
        })
        .unwrap_or(false);

    if active {
        ContextState::Active
    } else if TORN_DOWN.try_with(Cell::get).unwrap_or(false) {
        ContextState::TornDown
    } else {
        ContextState::Uninitialized
    }
}

/// Name the calling thread registered with.
pub fn current_name() -> RunLoopResult<String> {
    with_current(|context| context.name().to_string())
}

/// Handle to the calling thread's own loop.
pub fn current_handle() -> RunLoopResult<LoopHandle> {
    with_current(|context| context.event_loop.handle().clone())
}

/// Whether `target` currently names a registered thread.
pub fn is_registered(target: impl Into<ThreadTarget>) -> bool {
    registry().lookup(&target.into()).is_some()
}

/// Run `f` against the calling thread's context.
///
/// Callers must not execute user callbacks inside `f`.
pub(crate) fn with_current<R>(f: impl FnOnce(&ThreadContext) -> R) -> RunLoopResult<R> {
    CURRENT
        .try_with(|current| current.borrow().as_ref().map(f))
        .ok()
        .flatten()
        .ok_or(RunLoopError::NotRegistered)
}

/// Mutable variant of [`with_current`].
pub(crate) fn with_current_mut<R>(
    f: impl FnOnce(&mut ThreadContext) -> R,
) -> RunLoopResult<R> {
    CURRENT
        .try_with(|current| current.borrow_mut().as_mut().map(f))
        .ok()
        .flatten()
        .ok_or(RunLoopError::NotRegistered)
}

/// Best-effort mutable access that tolerates thread-local destruction.
pub(crate) fn try_with_current_mut(f: impl FnOnce(&mut ThreadContext)) {
    let _ = CURRENT.try_with(|current| {
        if let Ok(mut current) = current.try_borrow_mut() {
            if let Some(context) = current.as_mut() {
                f(context);
            }
        }
    });
}

#[cfg(test)]
#[path = "thread_context_tests.rs"]
mod tests;
