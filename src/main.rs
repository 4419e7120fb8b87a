//! Tether - per-thread cooperative event loops
//!
//! Main entry point for the Tether CLI.

mod adapters;
mod cli;
mod cmd_config;
mod cmd_demo;

use clap::Parser;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tether_config::{ConfigLoader, LoggingConfig};

use crate::cli::{Cli, Commands, DemoArgs};
use crate::cmd_config::handle_config_command;
use crate::cmd_demo::handle_demo_command;

fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console = fmt::layer().with_target(true).with_ansi(true);

    if !logging.file {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console)
            .init();
        return Ok(());
    }

    let log_dir = logging.effective_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&logging.file_prefix)
        .filename_suffix("log")
        .max_log_files(logging.max_files)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes buffered lines when the process exits normally.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = ConfigLoader::load_or_default(&cli.config)?;
    init_tracing(&config.logging)?;
    info!("Tether v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        None => handle_demo_command(&config, DemoArgs::default()),
        Some(Commands::Demo(args)) => handle_demo_command(&config, args),
        Some(Commands::Config { action }) => handle_config_command(action, &cli.config, &config),
    }
}
