//! Retry policy.
//!
//! # Responsibilities
//! - Hold the attempt budget, backoff sequence and per-attempt deadline
//! - Hold the statuses and credential markers that end a request at once
//! - Decide whether a classified failure earns another attempt
//!
//! # Design Decisions
//! - `max_retries` counts total attempts, so 3 means at most 3 calls
//! - The class decides eligibility; the attempt number only decides budget

use std::time::Duration;

use crate::config::schema::RetryConfig;
use crate::resilience::backoff::{backoff_delay, schedule_from_millis};
use crate::resilience::classify::ErrorClass;

/// Per-request retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_retries: u32,
    /// Ordered delays between attempts; the last entry is reused.
    pub backoff: Vec<Duration>,
    /// Deadline for a single attempt.
    pub timeout: Duration,
    /// Statuses that are never retried.
    pub non_retryable_statuses: Vec<u16>,
    /// Case-insensitive markers a target uses to signal bad credentials.
    pub credential_markers: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            backoff: schedule_from_millis(&config.backoff_ms),
            timeout: Duration::from_millis(config.timeout_ms),
            non_retryable_statuses: config.non_retryable_statuses.clone(),
            credential_markers: config
                .credential_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt with the given deadline.
    pub fn single_attempt(timeout: Duration) -> Self {
        Self {
            max_retries: 1,
            backoff: Vec::new(),
            timeout,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: Vec<Duration>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attempt budget, never below one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Delay before the attempt following `attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        backoff_delay(&self.backoff, attempt)
    }

    /// Whether a failure of `class` on `attempt` is followed by another attempt.
    pub fn should_retry(&self, class: ErrorClass, attempt: u32) -> bool {
        class.is_retryable() && attempt < self.max_attempts()
    }

    pub(crate) fn mentions_credential(&self, text: &str) -> bool {
        if text.is_empty() || self.credential_markers.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.credential_markers
            .iter()
            .any(|marker| !marker.is_empty() && lower.contains(marker.as_str()))
    }
}
