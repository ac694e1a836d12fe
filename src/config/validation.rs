//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, statuses are error statuses)
//! - Check URLs and socket addresses parse
//! - Detect duplicate health target names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ClientConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("retry.max_retries must be at least 1")]
    ZeroRetries,

    #[error("retry.timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("retry.non_retryable_statuses contains {0}, which is not a 4xx/5xx status")]
    NotAnErrorStatus(u16),

    #[error("connectivity.probe_url is invalid: {0}")]
    InvalidProbeUrl(String),

    #[error("connectivity.probe_interval_secs must be greater than zero")]
    ZeroProbeInterval,

    #[error("connectivity.probe_timeout_ms must be greater than zero")]
    ZeroProbeTimeout,

    #[error("health.timeout_ms must be greater than zero")]
    ZeroHealthTimeout,

    #[error("health target '{name}' has an invalid url: {reason}")]
    InvalidTargetUrl { name: String, reason: String },

    #[error("health target '{0}' is defined more than once")]
    DuplicateTarget(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let retry = &config.retry;
    if retry.max_retries == 0 {
        errors.push(ValidationError::ZeroRetries);
    }
    if retry.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    for &status in &retry.non_retryable_statuses {
        if !(400..=599).contains(&status) {
            errors.push(ValidationError::NotAnErrorStatus(status));
        }
    }

    let connectivity = &config.connectivity;
    if let Some(probe_url) = &connectivity.probe_url {
        if let Err(reason) = check_url(probe_url) {
            errors.push(ValidationError::InvalidProbeUrl(reason));
        }
        if connectivity.probe_interval_secs == 0 {
            errors.push(ValidationError::ZeroProbeInterval);
        }
        if connectivity.probe_timeout_ms == 0 {
            errors.push(ValidationError::ZeroProbeTimeout);
        }
    }

    if config.health.timeout_ms == 0 {
        errors.push(ValidationError::ZeroHealthTimeout);
    }
    let mut seen = HashSet::new();
    for target in &config.health.targets {
        if !seen.insert(target.name.as_str()) {
            errors.push(ValidationError::DuplicateTarget(target.name.clone()));
        }
        if let Err(reason) = check_url(&target.url) {
            errors.push(ValidationError::InvalidTargetUrl {
                name: target.name.clone(),
                reason,
            });
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(()),
        "http" | "https" => Err("missing host".to_string()),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}
