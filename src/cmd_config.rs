//! Config subcommand handlers for Tether.

use std::path::Path;

use tether_config::{Config, ConfigLoader, ConfigValidator};

use crate::cli::ConfigAction;

/// Handle config subcommands.
pub(crate) fn handle_config_command(
    action: ConfigAction,
    path: &Path,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Check => config_check(path, config),
        ConfigAction::Show => config_show(config),
    }
}

/// Validate the loaded configuration and report the findings.
fn config_check(path: &Path, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        println!("Checking {}", path.display());
    } else {
        println!("{} not found, checking defaults", path.display());
    }

    let result = ConfigValidator::validate(config)?;
    for warning in &result.warnings {
        println!("  warning: {}", warning);
    }
    for error in &result.errors {
        println!("  error:   {}", error);
    }

    if !result.is_valid() {
        return Err(format!("{} configuration error(s)", result.errors.len()).into());
    }
    println!("Configuration OK ({} warning(s))", result.warnings.len());
    Ok(())
}

/// Print the effective configuration.
fn config_show(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", ConfigLoader::to_toml_string(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_defaults() {
        let config = Config::default();
        assert!(config_check(Path::new("/nonexistent/tether.toml"), &config).is_ok());
    }

    #[test]
    fn test_check_reports_invalid_config() {
        let mut config = Config::default();
        config.runloop.idle_wait_ms = 0;
        config.demo.producers = 0;

        let err = config_check(Path::new("/nonexistent/tether.toml"), &config).unwrap_err();
        assert_eq!(err.to_string(), "2 configuration error(s)");
    }

    #[test]
    fn test_show() {
        assert!(config_show(&Config::default()).is_ok());
    }
}
