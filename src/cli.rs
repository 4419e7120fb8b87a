//! CLI definitions for Tether.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Tether CLI.
#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Per-thread cooperative event loops with cross-thread job delivery")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/tether.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the producer/consumer demo on the current thread (default)
    Demo(DemoArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Default)]
pub(crate) struct DemoArgs {
    /// Number of producer threads (overrides `demo.producers`)
    #[arg(long)]
    pub producers: Option<usize>,

    /// Jobs submitted by each producer (overrides `demo.jobs_per_producer`)
    #[arg(long)]
    pub jobs: Option<usize>,

    /// How the main thread services its loop
    #[arg(long, value_enum, default_value_t = DemoMode::Step)]
    pub mode: DemoMode,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum DemoMode {
    /// Poll with `step` until every job has run
    #[default]
    Step,
    /// Block in `run`; a final job exits the process
    Run,
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Load and validate the configuration file
    Check,

    /// Print the effective configuration as TOML
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["tether"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config/tether.toml"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_demo_args() {
        let cli = Cli::try_parse_from([
            "tether",
            "demo",
            "--producers",
            "3",
            "--jobs",
            "10",
            "--mode",
            "run",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Demo(args)) => {
                assert_eq!(args.producers, Some(3));
                assert_eq!(args.jobs, Some(10));
                assert_eq!(args.mode, DemoMode::Run);
            }
            _ => panic!("expected demo command"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["tether", "config", "show", "--config", "/tmp/t.toml"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("/tmp/t.toml"));
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Show
            })
        ));
    }

    #[test]
    fn test_invalid_mode_rejected() {
        assert!(Cli::try_parse_from(["tether", "demo", "--mode", "spin"]).is_err());
    }
}
