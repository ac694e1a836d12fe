//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Turn request events into structured log lines
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - Failed attempts log at `warn` only when they end the request

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::ObservabilityConfig;
use crate::observability::observer::{AttemptOutcome, AttemptRecord, OutcomeRecord, RequestObserver};
use crate::resilience::ErrorClass;

/// Install the global subscriber. Errors if one is already installed.
pub fn init_logging(
    config: &ObservabilityConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("resilient_client={}", config.log_level))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

/// Observer that writes request events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn on_attempt(&self, record: &AttemptRecord) {
        if record.outcome == AttemptOutcome::Success {
            tracing::debug!(
                request_id = %record.request_id,
                host = %record.host,
                attempt = record.attempt,
                elapsed_ms = record.elapsed_ms,
                status = ?record.status,
                "Attempt succeeded"
            );
        }
    }

    fn on_classify(&self, record: &AttemptRecord, class: ErrorClass) {
        tracing::info!(
            request_id = %record.request_id,
            host = %record.host,
            attempt = record.attempt,
            elapsed_ms = record.elapsed_ms,
            status = ?record.status,
            class = %class,
            retryable = class.is_retryable(),
            "Attempt failed"
        );
    }

    fn on_outcome(&self, outcome: &OutcomeRecord) {
        match outcome.error {
            None => tracing::debug!(
                request_id = %outcome.request_id,
                host = %outcome.host,
                attempts = outcome.attempts,
                elapsed_ms = outcome.elapsed_ms,
                "Request completed"
            ),
            Some(class) => tracing::warn!(
                request_id = %outcome.request_id,
                host = %outcome.host,
                attempts = outcome.attempts,
                elapsed_ms = outcome.elapsed_ms,
                status = ?outcome.status,
                class = %class,
                "Request failed"
            ),
        }
    }
}
