//! Metrics collection and exposition.
//!
//! # Metrics
//! - `client_requests_total` (counter): logical requests by host, result
//! - `client_attempts_total` (counter): attempts by host, outcome
//! - `client_request_duration_seconds` (histogram): end-to-end latency by host
//! - `client_connectivity_online` (gauge): 1=online, 0=offline
//! - `client_health_check_total` (counter): health checks by target, status

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::observability::observer::{AttemptOutcome, AttemptRecord, OutcomeRecord, RequestObserver};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_attempt(host: &str, outcome: AttemptOutcome) {
    let outcome = match outcome {
        AttemptOutcome::Success => "success",
        AttemptOutcome::Failed(class) => class.as_str(),
    };
    metrics::counter!(
        "client_attempts_total",
        "host" => host.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_request(host: &str, outcome: &OutcomeRecord) {
    let result = outcome.error.map_or("success", |class| class.as_str());
    metrics::counter!(
        "client_requests_total",
        "host" => host.to_string(),
        "result" => result
    )
    .increment(1);
    metrics::histogram!("client_request_duration_seconds", "host" => host.to_string())
        .record(Duration::from_millis(outcome.elapsed_ms).as_secs_f64());
}

pub fn record_connectivity(online: bool) {
    metrics::gauge!("client_connectivity_online").set(if online { 1.0 } else { 0.0 });
}

pub fn record_health_check(target: &str, healthy: bool) {
    metrics::counter!(
        "client_health_check_total",
        "target" => target.to_string(),
        "status" => if healthy { "healthy" } else { "unhealthy" }
    )
    .increment(1);
}

/// Observer that feeds the `metrics` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl RequestObserver for MetricsObserver {
    fn on_attempt(&self, record: &AttemptRecord) {
        record_attempt(&record.host, record.outcome);
    }

    fn on_outcome(&self, outcome: &OutcomeRecord) {
        record_request(&outcome.host, outcome);
    }
}
