//! Producer/consumer demo: worker threads feed jobs to the main thread's loop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use tether_config::{Config, ConfigError, ConfigValidator};
use tether_runloop::{
    loop_metrics, register_with_config, run, schedule_component_init, step, submit_to_main,
    unregister, MetricsSnapshot, StepOutcome,
};

use crate::adapters::runloop_config;
use crate::cli::{DemoArgs, DemoMode};

/// Execution bookkeeping, updated by jobs on the main thread.
struct Progress {
    next_sequence: Vec<AtomicUsize>,
    executed: AtomicUsize,
    out_of_order: AtomicUsize,
}

impl Progress {
    fn new(producers: usize) -> Self {
        Self {
            next_sequence: (0..producers).map(|_| AtomicUsize::new(0)).collect(),
            executed: AtomicUsize::new(0),
            out_of_order: AtomicUsize::new(0),
        }
    }

    fn record(&self, producer: usize, sequence: usize) {
        let expected = self.next_sequence[producer].fetch_add(1, Ordering::Relaxed);
        if expected != sequence {
            self.out_of_order.fetch_add(1, Ordering::Relaxed);
            warn!(producer, sequence, expected, "Job delivered out of order");
        }
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    fn executed(&self) -> usize {
        self.executed.load(Ordering::Relaxed)
    }

    fn out_of_order(&self) -> usize {
        self.out_of_order.load(Ordering::Relaxed)
    }
}

/// Handle the demo command.
pub(crate) fn handle_demo_command(
    config: &Config,
    args: DemoArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let validation = ConfigValidator::ensure_valid(config)?;
    for warning in &validation.warnings {
        warn!("Config: {}", warning);
    }

    let producers = args.producers.unwrap_or(config.demo.producers);
    let jobs = args.jobs.unwrap_or(config.demo.jobs_per_producer);
    if producers == 0 {
        return Err(ConfigError::InvalidValue {
            field: "--producers".to_string(),
            message: "must be greater than 0".to_string(),
        }
        .into());
    }

    let loop_config = runloop_config(&config.runloop)?;
    let main_name = loop_config.main_thread_name.clone();
    register_with_config(main_name.as_str(), loop_config)?;
    info!(
        thread = %main_name,
        producers,
        jobs,
        mode = ?args.mode,
        "Starting demo"
    );

    for component in 0..config.demo.initializers {
        schedule_component_init(move || {
            info!(component, "Component initialized");
        })?;
    }

    let progress = Arc::new(Progress::new(producers));
    let workers = spawn_producers(producers, jobs, progress.clone());

    match args.mode {
        DemoMode::Step => drive_step(workers, producers * jobs, &progress),
        DemoMode::Run => drive_run(workers, progress),
    }
}

/// Spawn producer threads that submit `jobs` jobs each to the main thread.
fn spawn_producers(
    producers: usize,
    jobs: usize,
    progress: Arc<Progress>,
) -> Vec<thread::JoinHandle<()>> {
    let start = Arc::new(Barrier::new(producers));
    (0..producers)
        .map(|producer| {
            let start = start.clone();
            let progress = progress.clone();
            thread::spawn(move || {
                start.wait();
                for sequence in 0..jobs {
                    let progress = progress.clone();
                    let submitted = submit_to_main(move || {
                        debug!(producer, sequence, "Job executed");
                        progress.record(producer, sequence);
                    });
                    if let Err(e) = submitted {
                        error!(producer, sequence, error = %e, "Failed to submit job");
                        return;
                    }
                }
                debug!(producer, "Producer finished");
            })
        })
        .collect()
}

/// Poll the loop until every job has executed, then tear it down.
fn drive_step(
    workers: Vec<thread::JoinHandle<()>>,
    total: usize,
    progress: &Progress,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        if step()? == StepOutcome::MoreWork {
            continue;
        }
        if progress.executed() >= total {
            break;
        }
        // A host would service its other event sources here.
        thread::sleep(Duration::from_millis(1));
    }

    join_producers(workers)?;
    let snapshot = loop_metrics()?;
    unregister()?;
    print_summary(&snapshot, progress)?;

    if progress.out_of_order() > 0 {
        return Err(format!("{} job(s) delivered out of order", progress.out_of_order()).into());
    }
    Ok(())
}

/// Block in `run`; a final job queued after every producer exits the process.
fn drive_run(
    workers: Vec<thread::JoinHandle<()>>,
    progress: Arc<Progress>,
) -> Result<(), Box<dyn std::error::Error>> {
    thread::spawn(move || {
        if let Err(e) = join_producers(workers) {
            error!(error = %e, "Producer failed");
        }
        let submitted = submit_to_main(move || {
            let code = match loop_metrics() {
                Ok(snapshot) => match print_summary(&snapshot, &progress) {
                    Ok(()) if progress.out_of_order() == 0 => 0,
                    Ok(()) => 1,
                    Err(e) => {
                        error!(error = %e, "Failed to print summary");
                        1
                    }
                },
                Err(e) => {
                    error!(error = %e, "Failed to read loop metrics");
                    1
                }
            };
            info!(code, "Demo finished");
            std::process::exit(code);
        });
        if let Err(e) = submitted {
            error!(error = %e, "Failed to submit shutdown job");
        }
    });

    match run()? {}
}

fn join_producers(workers: Vec<thread::JoinHandle<()>>) -> Result<(), Box<dyn std::error::Error>> {
    for worker in workers {
        worker.join().map_err(|_| "producer thread panicked")?;
    }
    Ok(())
}

fn print_summary(
    snapshot: &MetricsSnapshot,
    progress: &Progress,
) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Executed {} job(s) in {} quanta ({:.1} per quantum), {} out of order",
        progress.executed(),
        snapshot.quanta,
        snapshot.jobs_per_quantum(),
        progress.out_of_order()
    );
    println!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}
