//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[source] toml::de::Error),

    /// Every problem found, not just the first.
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.backoff_ms, vec![1000, 2000, 4000]);
        assert_eq!(config.health.timeout_ms, 5000);
        assert_eq!(config.connectivity.probe_interval_secs, 30);
    }

    #[test]
    fn test_full_file() {
        let config = parse_config(
            r#"
            [retry]
            max_retries = 5
            backoff_ms = [250, 500]
            timeout_ms = 10000

            [connectivity]
            probe_url = "https://notes.example.com/ping"
            probe_interval_secs = 15

            [[health.targets]]
            name = "code-runner"
            url = "https://runner.example.com/health"

            [[health.targets]]
            name = "assistant"
            url = "https://ai.example.com/health"

            [observability]
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.backoff_ms, vec![250, 500]);
        assert_eq!(config.retry.non_retryable_statuses, vec![400, 401, 403]);
        assert_eq!(
            config.connectivity.probe_url.as_deref(),
            Some("https://notes.example.com/ping")
        );
        assert_eq!(config.health.targets.len(), 2);
        assert_eq!(config.health.targets[0].name, "code-runner");
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_validation_failure_is_reported() {
        let err = parse_config("[retry]\nmax_retries = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Validation failed: retry.max_retries must be at least 1"
        );
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_config("[retry\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("Parse error: "));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_every_validation_error_is_listed() {
        let err = parse_config("[retry]\nmax_retries = 0\ntimeout_ms = 0\n").unwrap_err();
        match &err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(err.to_string().matches(", ").count(), 1);
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
