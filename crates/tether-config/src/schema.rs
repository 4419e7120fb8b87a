//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::loader::ConfigLoader;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runloop: RunLoopSettings,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub demo: DemoConfig,
}

impl Config {
    /// Per-user data directory (`~/.tether`).
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tether")
    }
}

/// Event loop settings applied to every registered thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLoopSettings {
    /// Name under which the host's main thread registers.
    #[serde(default = "default_main_thread_name")]
    pub main_thread_name: String,

    /// Longest idle wait inside a blocking loop, in milliseconds.
    #[serde(default = "default_idle_wait_ms")]
    pub idle_wait_ms: u64,

    /// `abort` or `log_and_continue`.
    #[serde(default = "default_failure_policy")]
    pub failure_policy: String,
}

impl Default for RunLoopSettings {
    fn default() -> Self {
        Self {
            main_thread_name: default_main_thread_name(),
            idle_wait_ms: default_idle_wait_ms(),
            failure_policy: default_failure_policy(),
        }
    }
}

fn default_main_thread_name() -> String {
    "main".to_string()
}

fn default_idle_wait_ms() -> u64 {
    1000
}

fn default_failure_policy() -> String {
    "abort".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,

    /// Also write logs to daily-rotated files.
    #[serde(default)]
    pub file: bool,

    /// Log directory; defaults to `~/.tether/logs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Maximum number of rotated files to keep.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: false,
            directory: None,
            file_prefix: default_file_prefix(),
            max_files: default_max_files(),
        }
    }
}

impl LoggingConfig {
    /// Directory log files are written to, with `~` expanded.
    pub fn effective_directory(&self) -> PathBuf {
        match self.directory {
            Some(ref dir) => PathBuf::from(ConfigLoader::expand_path(dir)),
            None => Config::data_dir().join("logs"),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_file_prefix() -> String {
    "tether".to_string()
}

fn default_max_files() -> usize {
    7
}

/// Workload used by `tether demo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Number of producer threads.
    #[serde(default = "default_producers")]
    pub producers: usize,

    /// Jobs submitted by each producer.
    #[serde(default = "default_jobs_per_producer")]
    pub jobs_per_producer: usize,

    /// Component initializers scheduled before the loop starts.
    #[serde(default = "default_initializers")]
    pub initializers: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            producers: default_producers(),
            jobs_per_producer: default_jobs_per_producer(),
            initializers: default_initializers(),
        }
    }
}

fn default_producers() -> usize {
    4
}

fn default_jobs_per_producer() -> usize {
    100
}

fn default_initializers() -> usize {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.runloop.main_thread_name, "main");
        assert_eq!(config.runloop.idle_wait_ms, 1000);
        assert_eq!(config.runloop.failure_policy, "abort");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.file);
        assert_eq!(config.demo.producers, 4);
    }

    #[test]
    fn test_data_dir() {
        assert!(Config::data_dir().ends_with(".tether"));
    }

    #[test]
    fn test_effective_directory_default() {
        let logging = LoggingConfig::default();
        assert!(logging.effective_directory().ends_with(".tether/logs"));
    }

    #[test]
    fn test_effective_directory_expands_tilde() {
        let logging = LoggingConfig {
            directory: Some("~/tether-logs".to_string()),
            ..Default::default()
        };
        let dir = logging.effective_directory();
        assert!(!dir.starts_with("~"));
        assert!(dir.ends_with("tether-logs"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.demo.jobs_per_producer, config.demo.jobs_per_producer);
        assert_eq!(parsed.logging.file_prefix, config.logging.file_prefix);
    }
}
