//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::health::HealthTarget;

/// Root configuration for the client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Default retry policy.
    pub retry: RetryConfig,

    /// Connectivity monitor settings.
    pub connectivity: ConnectivityConfig,

    /// Health check settings and targets.
    pub health: HealthConfig,

    /// Underlying HTTP transport.
    pub transport: TransportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_retries: u32,

    /// Delays between attempts in milliseconds; the last one is reused.
    pub backoff_ms: Vec<u64>,

    /// Deadline for a single attempt in milliseconds.
    pub timeout_ms: u64,

    /// HTTP statuses that are never retried.
    pub non_retryable_statuses: Vec<u16>,

    /// Body or error text that marks a credential rejection.
    pub credential_markers: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: vec![1000, 2000, 4000],
            timeout_ms: 30_000,
            non_retryable_statuses: vec![400, 401, 403],
            credential_markers: vec![
                "invalid credential".to_string(),
                "invalid_credential".to_string(),
                "invalid api key".to_string(),
            ],
        }
    }
}

/// Connectivity monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Same-origin URL probed to catch "falsely online" states.
    /// No probing when unset.
    pub probe_url: Option<String>,

    /// Probe interval in seconds.
    pub probe_interval_secs: u64,

    /// Probe timeout in milliseconds.
    pub probe_timeout_ms: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_url: None,
            probe_interval_secs: 30,
            probe_timeout_ms: 5000,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Deadline for each health check in milliseconds.
    pub timeout_ms: u64,

    /// Targets checked by `health` and `diagnose`.
    pub targets: Vec<HealthTarget>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            targets: Vec::new(),
        }
    }
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// User-Agent header sent with every request.
    pub user_agent: String,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Idle pooled connections are closed after this many seconds.
    pub pool_idle_timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("resilient-client/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout_ms: 10_000,
            pool_idle_timeout_secs: 90,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Number of recent attempts kept for diagnostics.
    pub recent_attempts: usize,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
            recent_attempts: 50,
        }
    }
}
