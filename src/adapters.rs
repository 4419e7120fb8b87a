//! Conversions between the configuration file and the runloop crate.

use tether_config::{ConfigError, RunLoopSettings};
use tether_runloop::{FailurePolicy, RunLoopConfig};

/// Parse a `runloop.failure_policy` value.
pub(crate) fn parse_failure_policy(value: &str) -> Result<FailurePolicy, ConfigError> {
    match value {
        "abort" => Ok(FailurePolicy::Abort),
        "log_and_continue" => Ok(FailurePolicy::LogAndContinue),
        other => Err(ConfigError::InvalidValue {
            field: "runloop.failure_policy".to_string(),
            message: format!("unknown failure policy '{}'", other),
        }),
    }
}

/// Build the per-loop configuration from the `[runloop]` section.
pub(crate) fn runloop_config(settings: &RunLoopSettings) -> Result<RunLoopConfig, ConfigError> {
    Ok(RunLoopConfig {
        main_thread_name: settings.main_thread_name.clone(),
        idle_wait_ms: settings.idle_wait_ms,
        failure_policy: parse_failure_policy(&settings.failure_policy)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_config::FAILURE_POLICIES;

    #[test]
    fn test_every_accepted_policy_parses() {
        for policy in FAILURE_POLICIES {
            let parsed = parse_failure_policy(policy).unwrap();
            assert_eq!(parsed.to_string(), policy);
        }
    }

    #[test]
    fn test_unknown_policy() {
        let err = parse_failure_policy("retry").unwrap_err();
        assert!(err.to_string().contains("runloop.failure_policy"));
    }

    #[test]
    fn test_runloop_config() {
        let settings = RunLoopSettings {
            main_thread_name: "ui".to_string(),
            idle_wait_ms: 20,
            failure_policy: "log_and_continue".to_string(),
        };
        let config = runloop_config(&settings).unwrap();
        assert_eq!(config.main_thread_name, "ui");
        assert_eq!(config.idle_wait_ms, 20);
        assert_eq!(config.failure_policy, FailurePolicy::LogAndContinue);
    }
}
