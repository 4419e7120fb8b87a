//! Configuration validation.

use std::fmt;

use crate::error::ConfigError;
use crate::schema::Config;

/// Values accepted by `runloop.failure_policy`.
pub const FAILURE_POLICIES: [&str; 2] = ["abort", "log_and_continue"];

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_runloop(config, &mut result);
        Self::validate_logging(config, &mut result);
        Self::validate_demo(config, &mut result);

        Ok(result)
    }

    /// Validate and turn the first error into a `ConfigError`.
    pub fn ensure_valid(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = Self::validate(config)?;
        if result.errors.is_empty() {
            return Ok(result);
        }
        let first = result.errors.swap_remove(0);
        Err(ConfigError::InvalidValue {
            field: first.path,
            message: first.message,
        })
    }

    fn validate_runloop(config: &Config, result: &mut ValidationResult) {
        let runloop = &config.runloop;

        if runloop.main_thread_name.trim().is_empty() {
            result.add_error(ValidationError::new(
                "runloop.main_thread_name",
                "main_thread_name cannot be empty",
            ));
        }

        if runloop.idle_wait_ms == 0 {
            result.add_error(ValidationError::new(
                "runloop.idle_wait_ms",
                "idle_wait_ms must be greater than 0",
            ));
        }

        if runloop.idle_wait_ms > 60_000 {
            result.add_warning(ValidationWarning::new(
                "runloop.idle_wait_ms",
                "idle_wait_ms is very high (>60s), idle loops will log wakeups rarely",
            ));
        }

        if !FAILURE_POLICIES.contains(&runloop.failure_policy.as_str()) {
            result.add_error(ValidationError::new(
                "runloop.failure_policy",
                format!(
                    "Unknown failure policy '{}', valid values: {:?}",
                    runloop.failure_policy, FAILURE_POLICIES
                ),
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let logging = &config.logging;

        if logging.level.trim().is_empty() {
            result.add_error(ValidationError::new(
                "logging.level",
                "level cannot be empty",
            ));
        } else if !logging.level.contains('=')
            && !LOG_LEVELS.contains(&logging.level.to_ascii_lowercase().as_str())
        {
            // Directives like `tether=debug` are passed through to EnvFilter.
            result.add_warning(ValidationWarning::new(
                "logging.level",
                format!(
                    "Unknown log level '{}', valid values: {:?}",
                    logging.level, LOG_LEVELS
                ),
            ));
        }

        if logging.file {
            if logging.file_prefix.is_empty() {
                result.add_error(ValidationError::new(
                    "logging.file_prefix",
                    "file_prefix cannot be empty when file logging is enabled",
                ));
            }
            if logging.max_files == 0 {
                result.add_error(ValidationError::new(
                    "logging.max_files",
                    "max_files must be greater than 0",
                ));
            }
        }
    }

    fn validate_demo(config: &Config, result: &mut ValidationResult) {
        let demo = &config.demo;

        if demo.producers == 0 {
            result.add_error(ValidationError::new(
                "demo.producers",
                "producers must be greater than 0",
            ));
        }

        if demo.producers > 64 {
            result.add_warning(ValidationWarning::new(
                "demo.producers",
                "producers is very high (>64), each one is an OS thread",
            ));
        }

        if demo.jobs_per_producer == 0 {
            result.add_warning(ValidationWarning::new(
                "demo.jobs_per_producer",
                "jobs_per_producer is 0, the demo will only run initializers",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
