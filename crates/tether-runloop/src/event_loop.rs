//! Per-thread event loop: deferred component initialization, cross-thread
//! job delivery, and the shared quantum behind `run` and `step`.
//!
//! A quantum runs every initializer pending when it starts; if there were
//! none, it delivers the jobs queued at that instant instead. Work that
//! arrives during a quantum waits for the next one. Callbacks always run on
//! the owner thread and never while the thread-local context is borrowed, so
//! they may schedule initializers or submit jobs themselves.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::config::{FailurePolicy, RunLoopConfig};
use crate::error::{CallbackKind, RunLoopError, RunLoopResult};
use crate::handle::{LoopHandle, ThreadTarget};
use crate::job_queue::JobQueue;
use crate::metrics::{MetricsSnapshot, RunLoopMetrics};
use crate::registry::registry;
use crate::state::{LoopState, StepOutcome};
use crate::thread_context::{try_with_current_mut, with_current, with_current_mut};

/// A component startup routine. Scheduled and executed on the owner thread
/// only, so it need not be `Send`.
pub(crate) type PendingInitializer = Box<dyn FnOnce() + 'static>;

/// Loop state owned by a [`ThreadContext`](crate::thread_context::ThreadContext).
pub(crate) struct EventLoop {
    initializers: VecDeque<PendingInitializer>,
    handle: LoopHandle,
    state: LoopState,
    config: RunLoopConfig,
    metrics: Arc<RunLoopMetrics>,
}

/// The work a single quantum will perform, fixed when it begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantum {
    Initializers(usize),
    Jobs(usize),
}

impl EventLoop {
    pub(crate) fn new(
        handle: LoopHandle,
        config: RunLoopConfig,
        metrics: Arc<RunLoopMetrics>,
    ) -> Self {
        Self {
            initializers: VecDeque::new(),
            handle,
            state: LoopState::Idle,
            config,
            metrics,
        }
    }

    pub(crate) fn handle(&self) -> &LoopHandle {
        &self.handle
    }

    fn queue(&self) -> Arc<JobQueue> {
        self.handle.queue().clone()
    }

    fn has_pending_work(&self) -> bool {
        !self.initializers.is_empty() || !self.handle.queue().is_empty()
    }

    fn plan_quantum(&self) -> Quantum {
        if self.initializers.is_empty() {
            Quantum::Jobs(self.handle.queue().len())
        } else {
            Quantum::Initializers(self.initializers.len())
        }
    }

    /// Close the job queue and drop pending initializers.
    ///
    /// Returns the number of discarded items.
    pub(crate) fn teardown(&mut self) -> usize {
        let jobs = self.handle.queue().close();
        let initializers = std::mem::take(&mut self.initializers);
        let count = initializers.len();
        drop(initializers);
        self.metrics.record_dropped(count as u64);
        jobs + count
    }
}

/// Marks the loop Running for the lifetime of a `run`/`step` call.
///
/// The guard is bound to the context it entered: once that context is torn
/// down, every access through the guard fails with `NotRegistered`, even if
/// the thread has registered again in the meantime.
struct RunningGuard {
    queue: Arc<JobQueue>,
}

impl RunningGuard {
    fn enter() -> RunLoopResult<Self> {
        let queue = with_current_mut(|context| {
            let event_loop = &mut context.event_loop;
            if event_loop.state == LoopState::Running {
                return Err(RunLoopError::AlreadyRunning);
            }
            event_loop.state = LoopState::Running;
            event_loop.metrics.mark_start();
            Ok(event_loop.queue())
        })??;
        Ok(RunningGuard { queue })
    }

    fn owns(&self, event_loop: &EventLoop) -> bool {
        Arc::ptr_eq(&self.queue, event_loop.handle.queue())
    }

    fn with_loop<R>(&self, f: impl FnOnce(&EventLoop) -> R) -> RunLoopResult<R> {
        with_current(|context| {
            let event_loop = &context.event_loop;
            self.owns(event_loop).then(|| f(event_loop))
        })?
        .ok_or(RunLoopError::NotRegistered)
    }

    fn with_loop_mut<R>(&self, f: impl FnOnce(&mut EventLoop) -> R) -> RunLoopResult<R> {
        with_current_mut(|context| {
            let event_loop = &mut context.event_loop;
            if self.owns(event_loop) {
                Some(f(event_loop))
            } else {
                None
            }
        })?
        .ok_or(RunLoopError::NotRegistered)
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        try_with_current_mut(|context| {
            if self.owns(&context.event_loop) {
                context.event_loop.state = LoopState::Idle;
            }
        });
    }
}

/// Queue a component initializer on the calling thread's loop.
///
/// Initializers scheduled before the loop starts all run before any job.
/// Scheduled while the loop runs, an initializer runs at the next quantum.
pub fn schedule_component_init<F>(initializer: F) -> RunLoopResult<()>
where
    F: FnOnce() + 'static,
{
    with_current_mut(|context| {
        context
            .event_loop
            .initializers
            .push_back(Box::new(initializer));
        debug!(
            thread = %context.name(),
            pending = context.event_loop.initializers.len(),
            "Component initializer scheduled"
        );
    })
}

/// Queue `job` on the loop owned by `target`.
///
/// Returns as soon as the job is queued. The job runs on the target thread
/// during a later quantum, even when the caller is the target.
pub fn submit_job<F>(target: impl Into<ThreadTarget>, job: F) -> RunLoopResult<()>
where
    F: FnOnce() + Send + 'static,
{
    let target = target.into();
    let handle = registry()
        .lookup(&target)
        .ok_or_else(|| RunLoopError::UnknownThread(target.to_string()))?;
    handle.submit(job)
}

/// Queue `job` on the main thread.
///
/// From a registered thread, the main thread is the one registered under that
/// thread's configured `main_thread_name`. From any other thread, it is the
/// most recently registered of the threads whose name matches their own
/// configured `main_thread_name`.
pub fn submit_to_main<F>(job: F) -> RunLoopResult<()>
where
    F: FnOnce() + Send + 'static,
{
    let configured = with_current(|context| context.event_loop.config.main_thread_name.clone());
    let handle = match configured {
        Ok(main_name) => registry()
            .lookup(&ThreadTarget::Name(main_name.clone()))
            .ok_or(RunLoopError::UnknownThread(main_name))?,
        Err(_) => registry().main_handle().ok_or_else(|| {
            RunLoopError::UnknownThread(RunLoopConfig::default().main_thread_name)
        })?,
    };
    handle.submit(job)
}

/// Perform one quantum of work on the calling thread's loop. Never blocks.
///
/// Returns [`StepOutcome::MoreWork`] when initializers or jobs are still
/// pending after the quantum, [`StepOutcome::WouldBlock`] otherwise.
pub fn step() -> RunLoopResult<StepOutcome> {
    let running = RunningGuard::enter()?;
    run_quantum(&running)
}

/// Service the calling thread's loop until a fatal error.
///
/// Drains pending initializers, then alternates between delivering queued
/// jobs and parking until a submission arrives. Only returns on error: a
/// callback failure under [`FailurePolicy::Abort`], the context being torn
/// down from inside a callback, or a nested invocation.
pub fn run() -> RunLoopResult<Infallible> {
    let running = RunningGuard::enter()?;
    let (name, idle_wait) = with_current(|context| {
        (
            context.name().to_string(),
            context.event_loop.config.idle_wait(),
        )
    })?;
    info!(thread = %name, "RunLoop: Entry");

    let result = service_forever(&running, idle_wait);
    if let Err(ref e) = result {
        error!(thread = %name, error = %e, "RunLoop: Exit");
    }
    result
}

fn service_forever(running: &RunningGuard, idle_wait: Duration) -> RunLoopResult<Infallible> {
    loop {
        if run_quantum(running)?.is_more_work() {
            continue;
        }

        // Only the owner schedules initializers, so nothing but a job can
        // arrive while parked.
        let (queue, metrics) =
            running.with_loop(|event_loop| (event_loop.queue(), event_loop.metrics.clone()))?;
        debug!("RunLoop: BeforeWaiting");
        let wait_start = Instant::now();
        queue.wait(idle_wait);
        metrics.record_wakeup(wait_start.elapsed().as_micros() as u64);
    }
}

/// State of the calling thread's loop.
pub fn loop_state() -> RunLoopResult<LoopState> {
    with_current(|context| context.event_loop.state)
}

/// Metrics of the calling thread's loop.
pub fn loop_metrics() -> RunLoopResult<MetricsSnapshot> {
    with_current(|context| context.event_loop.metrics.snapshot())
}

fn run_quantum(running: &RunningGuard) -> RunLoopResult<StepOutcome> {
    let (quantum, queue, metrics, policy) = running.with_loop(|event_loop| {
        (
            event_loop.plan_quantum(),
            event_loop.queue(),
            event_loop.metrics.clone(),
            event_loop.config.failure_policy,
        )
    })?;
    metrics.record_quantum();
    debug!(?quantum, "RunLoop: quantum");

    match quantum {
        Quantum::Initializers(count) => {
            for _ in 0..count {
                let next = running.with_loop_mut(|event_loop| event_loop.initializers.pop_front())?;
                let Some(initializer) = next else { break };
                metrics.record_initializer();
                execute(CallbackKind::Initializer, initializer, policy, &metrics)?;
            }
        }
        Quantum::Jobs(count) => {
            for _ in 0..count {
                let Some(job) = queue.pop() else { break };
                metrics.record_job_run();
                execute(CallbackKind::Job, job, policy, &metrics)?;
            }
        }
    }

    let outcome = if running.with_loop(EventLoop::has_pending_work)? {
        StepOutcome::MoreWork
    } else {
        StepOutcome::WouldBlock
    };
    Ok(outcome)
}

/// Run one callback, containing a panic according to `policy`.
fn execute<F>(
    kind: CallbackKind,
    callback: F,
    policy: FailurePolicy,
    metrics: &RunLoopMetrics,
) -> RunLoopResult<()>
where
    F: FnOnce(),
{
    let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) else {
        return Ok(());
    };

    let message = panic_message(payload.as_ref());
    metrics.record_failure();
    error!(%kind, %message, "Callback panicked");

    match policy {
        FailurePolicy::Abort => Err(RunLoopError::CallbackPanicked { kind, message }),
        FailurePolicy::LogAndContinue => {
            warn!(%kind, "Continuing after callback failure");
            Ok(())
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "event_loop_tests.rs"]
mod tests;
