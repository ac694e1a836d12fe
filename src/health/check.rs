//! One-shot health checks against named targets.

use std::collections::BTreeMap;
use std::time::Instant;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use crate::http::{RequestOptions, ResilientClient};
use crate::observability::metrics;
use crate::resilience::{ErrorClass, RetryPolicy};

/// A named endpoint to check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthTarget {
    pub name: String,
    pub url: String,
}

impl HealthTarget {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of checking one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// Short human-readable explanation.
    pub detail: String,
    pub http_status: Option<u16>,
    /// Failure class when unhealthy.
    pub class: Option<ErrorClass>,
    pub latency_ms: u64,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

impl ResilientClient {
    /// Check every target concurrently with one attempt each.
    ///
    /// Never fails; an unreachable target yields an unhealthy report.
    /// A name listed twice keeps the last report. Checks are sent even
    /// while connectivity reports offline.
    pub async fn health_check(&self, targets: &[HealthTarget]) -> BTreeMap<String, HealthReport> {
        let policy = self.health_policy();

        let checks = targets.iter().map(|target| {
            let policy = &policy;
            async move {
                let report = self.check_one(target, policy).await;
                metrics::record_health_check(&target.name, report.is_healthy());
                (target.name.clone(), report)
            }
        });

        join_all(checks).await.into_iter().collect()
    }

    /// The default policy cut down to one attempt under the health deadline.
    fn health_policy(&self) -> RetryPolicy {
        (*self.default_policy())
            .clone()
            .with_max_retries(1)
            .with_backoff(Vec::new())
            .with_timeout(self.health_timeout())
    }

    async fn check_one(&self, target: &HealthTarget, policy: &RetryPolicy) -> HealthReport {
        let started = Instant::now();
        let result = self
            .request_ungated(&target.url, RequestOptions::get(), policy)
            .await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(response) => {
                tracing::debug!(name = %target.name, status = %response.status, "Health check passed");
                HealthReport {
                    status: HealthStatus::Healthy,
                    detail: format!("HTTP {}", response.status.as_u16()),
                    http_status: Some(response.status.as_u16()),
                    class: None,
                    latency_ms,
                }
            }
            Err(err) => {
                tracing::info!(name = %target.name, class = %err.class, "Health check failed");
                HealthReport {
                    status: HealthStatus::Unhealthy,
                    detail: err.message.clone(),
                    http_status: err.status.map(|s| s.as_u16()),
                    class: Some(err.class),
                    latency_ms,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{connectivity_channel, SignalSource};
    use crate::http::testing::{ScriptedTransport, Step};
    use crate::http::transport::TransportErrorKind;
    use std::sync::Arc;
    use std::time::Duration;

    fn targets() -> Vec<HealthTarget> {
        vec![
            HealthTarget::new("api", "https://api.notes.test/health"),
            HealthTarget::new("auth", "https://auth.notes.test/health"),
            HealthTarget::new("storage", "https://storage.notes.test/health"),
        ]
    }

    fn transport() -> Arc<ScriptedTransport> {
        Arc::new(ScriptedTransport::per_host(vec![
            ("api.notes.test", Step::Status(200, "ok")),
            ("auth.notes.test", Step::Status(503, "down")),
            ("storage.notes.test", Step::Fail(TransportErrorKind::Connect, "connection refused")),
        ]))
    }

    #[tokio::test]
    async fn test_reports_every_target() {
        let transport = transport();
        let client = ResilientClient::builder()
            .transport(transport.clone())
            .build()
            .unwrap();

        let reports = client.health_check(&targets()).await;

        assert_eq!(reports.len(), 3);
        assert!(reports["api"].is_healthy());
        assert_eq!(reports["api"].http_status, Some(200));

        let auth = &reports["auth"];
        assert_eq!(auth.status, HealthStatus::Unhealthy);
        assert_eq!(auth.http_status, Some(503));
        assert_eq!(auth.class, Some(ErrorClass::ServerError));

        assert_eq!(reports["storage"].class, Some(ErrorClass::Network));
        // Exactly one attempt per target, no retries.
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_repeated_checks_agree() {
        let client = ResilientClient::builder()
            .transport(transport())
            .build()
            .unwrap();

        let first = client.health_check(&targets()).await;
        let second = client.health_check(&targets()).await;
        let statuses = |r: &BTreeMap<String, HealthReport>| {
            r.iter().map(|(k, v)| (k.clone(), v.status)).collect::<Vec<_>>()
        };
        assert_eq!(statuses(&first), statuses(&second));
    }

    #[tokio::test]
    async fn test_empty_targets() {
        let client = ResilientClient::builder()
            .transport(transport())
            .build()
            .unwrap();
        assert!(client.health_check(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_offline_still_checks_each_target_once() {
        let transport = transport();
        let (writer, reader) = connectivity_channel();
        writer.set_online(false, SignalSource::Host);
        let client = ResilientClient::builder()
            .transport(transport.clone())
            .connectivity(reader)
            .build()
            .unwrap();

        let reports = client.health_check(&targets()).await;
        assert!(reports["api"].is_healthy());
        assert_eq!(reports["storage"].class, Some(ErrorClass::Network));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_uses_configured_classification() {
        let transport = Arc::new(ScriptedTransport::per_host(vec![
            ("api.notes.test", Step::Status(503, "maintenance")),
            ("auth.notes.test", Step::Status(500, "session revoked")),
        ]));
        let policy = RetryPolicy::default().with_max_retries(5);
        let policy = RetryPolicy {
            non_retryable_statuses: vec![503],
            credential_markers: vec!["session revoked".to_string()],
            ..policy
        };
        let client = ResilientClient::builder()
            .transport(transport.clone())
            .policy(policy)
            .build()
            .unwrap();

        let reports = client
            .health_check(&[
                HealthTarget::new("api", "https://api.notes.test/health"),
                HealthTarget::new("auth", "https://auth.notes.test/health"),
            ])
            .await;

        assert_eq!(reports["api"].class, Some(ErrorClass::ClientRejected));
        assert_eq!(reports["auth"].class, Some(ErrorClass::ClientRejected));
        // The configured retry budget does not apply to checks.
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_target_times_out() {
        let client = ResilientClient::builder()
            .transport(Arc::new(ScriptedTransport::repeating(Step::Hang)))
            .health_timeout(Duration::from_millis(200))
            .build()
            .unwrap();

        let reports = client
            .health_check(&[HealthTarget::new("slow", "https://slow.notes.test/")])
            .await;
        assert_eq!(reports["slow"].class, Some(ErrorClass::Timeout));
    }
}
