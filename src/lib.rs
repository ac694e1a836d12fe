//! Resilient HTTP request client.
//!
//! Every outbound request goes through one pipeline: a connectivity gate,
//! a per-attempt deadline with cooperative cancellation, failure
//! classification, and bounded retries on a fixed backoff schedule.
//! Health checks and troubleshooting reuse the same pipeline.

// Core pipeline
pub mod http;
pub mod resilience;

// Environment
pub mod connectivity;
pub mod health;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ClientConfig;
pub use connectivity::{connectivity_channel, ConnectivityMonitor, ConnectivityReader};
pub use health::{HealthReport, HealthTarget, TroubleshootReport};
pub use http::{RequestError, RequestOptions, ResilientClient};
pub use lifecycle::Shutdown;
pub use resilience::{ErrorClass, RetryPolicy};
