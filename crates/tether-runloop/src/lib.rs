//! # Tether RunLoop
//!
//! Per-thread cooperative event loop with cross-thread job submission.
//!
//! A thread registers itself with [`register`], optionally schedules
//! component initializers with [`schedule_component_init`], then services its
//! loop either with [`run`] (never returns under normal operation) or with
//! [`step`] (one bounded, non-blocking quantum per call). Any thread may hand
//! work to a registered thread through [`submit_job`] or a [`LoopHandle`];
//! that work only ever executes on the owner thread.
//!
//! ## Architecture
//!
//! ```text
//!   producer threads                      owner thread
//!  ┌──────────────┐  submit_job   ┌──────────────────────────────────┐
//!  │ submit_job() ├──────────────►│ JobQueue (MPSC, condvar wakeup)  │
//!  └──────────────┘               │                                  │
//!  ┌──────────────┐               │ ThreadContext (thread-local)     │
//!  │ LoopHandle   ├──────────────►│  └─ EventLoop                    │
//!  └──────────────┘               │      ├─ pending initializers     │
//!                                 │      └─ run() / step() quantum   │
//!                                 └──────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use tether_runloop::{register, schedule_component_init, step, submit_job, unregister, StepOutcome};
//!
//! register("example-main").unwrap();
//! schedule_component_init(|| println!("component ready")).unwrap();
//! assert_eq!(step().unwrap(), StepOutcome::WouldBlock);
//!
//! std::thread::spawn(|| submit_job("example-main", || println!("hello from the owner"))).join().unwrap().unwrap();
//! assert_eq!(step().unwrap(), StepOutcome::WouldBlock);
//! unregister().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod event_loop;
pub mod handle;
mod job_queue;
pub mod metrics;
mod registry;
pub mod state;
pub mod thread_context;

// Re-exports
pub use config::{FailurePolicy, RunLoopConfig};
pub use error::{CallbackKind, RunLoopError, RunLoopResult};
pub use event_loop::{
    loop_metrics, loop_state, run, schedule_component_init, step, submit_job, submit_to_main,
};
pub use handle::{LoopHandle, ThreadTarget};
pub use metrics::{MetricsSnapshot, RunLoopMetrics};
pub use state::{ContextState, LoopState, StepOutcome};
pub use thread_context::{
    context_state, current_handle, current_name, is_registered, register, register_with_config,
    unregister,
};
