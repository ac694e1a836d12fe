//! Resilient request client.
//!
//! # Responsibilities
//! - Refuse to send anything while connectivity reports offline
//! - Run attempts strictly one after another, each under a deadline
//! - Classify every failed attempt and stop on terminal classes
//! - Sleep the configured backoff between retryable failures
//! - Re-check connectivity after each backoff before the next attempt
//! - Report attempts and outcomes to the registered observers
//!
//! # Design Decisions
//! - Each request snapshots the default policy once, so a hot reload never
//!   changes the rules halfway through a request
//! - Requests share nothing mutable except the connectivity reader
//! - The caller's token cancels the in-flight attempt and any pending backoff

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use reqwest::StatusCode;
use url::Url;
use uuid::Uuid;

use crate::config::schema::{ClientConfig, TransportConfig};
use crate::connectivity::ConnectivityReader;
use crate::http::error::RequestError;
use crate::http::request::{redacted_host, RequestOptions};
use crate::http::response::HttpResponse;
use crate::http::transport::{ReqwestTransport, Transport, TransportError};
use crate::observability::observer::{AttemptOutcome, AttemptRecord, OutcomeRecord, RequestObserver};
use crate::resilience::classify::{classify_status, classify_transport};
use crate::resilience::timeouts::{run_guarded, until_cancelled, Guarded};
use crate::resilience::{ErrorClass, RetryPolicy, Scheduler, TokioScheduler};

const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client with connectivity gating, deadlines and classified retries.
///
/// Cloning is cheap and clones share the transport, the connectivity view,
/// the observers and the default policy.
#[derive(Clone)]
pub struct ResilientClient {
    transport: Arc<dyn Transport>,
    scheduler: Arc<dyn Scheduler>,
    connectivity: ConnectivityReader,
    policy: Arc<ArcSwap<RetryPolicy>>,
    observers: Arc<[Arc<dyn RequestObserver>]>,
    health_timeout: Duration,
}

impl ResilientClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Perform `target` with bounded latency and bounded retries.
    ///
    /// `policy` overrides the client's default policy for this call only.
    pub async fn request(
        &self,
        target: &str,
        options: RequestOptions,
        policy: Option<&RetryPolicy>,
    ) -> Result<HttpResponse, RequestError> {
        self.execute(target, options, policy, Gate::Connectivity).await
    }

    /// Same pipeline as [`request`](Self::request) without the offline gate.
    ///
    /// Health checks use this so a target is tried even while the host
    /// reports offline.
    pub(crate) async fn request_ungated(
        &self,
        target: &str,
        options: RequestOptions,
        policy: &RetryPolicy,
    ) -> Result<HttpResponse, RequestError> {
        self.execute(target, options, Some(policy), Gate::Bypass).await
    }

    async fn execute(
        &self,
        target: &str,
        options: RequestOptions,
        policy: Option<&RetryPolicy>,
        gate: Gate,
    ) -> Result<HttpResponse, RequestError> {
        let default_policy;
        let policy = match policy {
            Some(policy) => policy,
            None => {
                default_policy = self.policy.load_full();
                default_policy.as_ref()
            }
        };

        let request_id = Uuid::new_v4();
        let started = Instant::now();

        let url = match parse_target(target) {
            Ok(url) => url,
            Err(err) => return Err(self.fail(request_id, started, err)),
        };
        let host = redacted_host(&url);
        let signal = options.signal.as_ref();

        if gate == Gate::Connectivity && !self.connectivity.is_online() {
            let err = RequestError::new(ErrorClass::Network, host, 0, "host is offline");
            return Err(self.fail(request_id, started, err));
        }
        if signal.is_some_and(|token| token.is_cancelled()) {
            let err = RequestError::new(ErrorClass::Cancelled, host, 0, "cancelled before sending");
            return Err(self.fail(request_id, started, err));
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            let attempt_started = Instant::now();
            let send = self.transport.send(options.to_request(&url));

            let failure = match run_guarded(send, policy.timeout, signal).await {
                Guarded::Completed(Ok(response)) if response.is_success() => {
                    let record = AttemptRecord {
                        request_id,
                        host: host.clone(),
                        attempt,
                        elapsed_ms: millis(attempt_started),
                        outcome: AttemptOutcome::Success,
                        status: Some(response.status.as_u16()),
                    };
                    for observer in self.observers.iter() {
                        observer.on_attempt(&record);
                    }
                    self.emit_outcome(OutcomeRecord {
                        request_id,
                        host,
                        attempts: attempt,
                        elapsed_ms: millis(started),
                        status: Some(response.status.as_u16()),
                        error: None,
                    });
                    return Ok(response);
                }
                Guarded::Completed(Ok(response)) => Failure::from_response(&response, policy),
                Guarded::Completed(Err(err)) => Failure::from_transport(err, policy),
                Guarded::TimedOut => Failure::bare(
                    ErrorClass::Timeout,
                    format!("attempt timed out after {}ms", policy.timeout.as_millis()),
                ),
                Guarded::Cancelled => Failure::bare(ErrorClass::Cancelled, "cancelled by caller"),
            };

            let record = AttemptRecord {
                request_id,
                host: host.clone(),
                attempt,
                elapsed_ms: millis(attempt_started),
                outcome: AttemptOutcome::Failed(failure.class),
                status: failure.status.map(|s| s.as_u16()),
            };
            for observer in self.observers.iter() {
                observer.on_classify(&record, failure.class);
                observer.on_attempt(&record);
            }

            if !policy.should_retry(failure.class, attempt) {
                let err = failure.into_error(host, attempt);
                return Err(self.fail(request_id, started, err));
            }

            let delay = policy.delay_after(attempt);
            if until_cancelled(self.scheduler.sleep(delay), signal).await.is_none() {
                let err = RequestError::new(ErrorClass::Cancelled, host, attempt, "cancelled during backoff");
                return Err(self.fail(request_id, started, err));
            }
            if gate == Gate::Connectivity && !self.connectivity.is_online() {
                let err = RequestError::new(
                    ErrorClass::Network,
                    host,
                    attempt,
                    "connectivity lost while waiting to retry",
                );
                return Err(self.fail(request_id, started, err));
            }
        }
    }

    /// Policy used when `request` is called without an override.
    pub fn default_policy(&self) -> Arc<RetryPolicy> {
        self.policy.load_full()
    }

    /// Replace the default policy for requests started from now on.
    pub fn set_default_policy(&self, policy: RetryPolicy) {
        self.policy.store(Arc::new(policy));
    }

    pub fn connectivity(&self) -> &ConnectivityReader {
        &self.connectivity
    }

    pub(crate) fn health_timeout(&self) -> Duration {
        self.health_timeout
    }

    fn fail(&self, request_id: Uuid, started: Instant, err: RequestError) -> RequestError {
        self.emit_outcome(OutcomeRecord {
            request_id,
            host: err.host.clone(),
            attempts: err.attempts,
            elapsed_ms: millis(started),
            status: err.status.map(|s| s.as_u16()),
            error: Some(err.class),
        });
        err
    }

    fn emit_outcome(&self, outcome: OutcomeRecord) {
        for observer in self.observers.iter() {
            observer.on_outcome(&outcome);
        }
    }
}

impl std::fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientClient")
            .field("policy", &self.policy.load())
            .field("online", &self.connectivity.is_online())
            .field("observers", &self.observers.len())
            .field("health_timeout", &self.health_timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    /// Refuse while offline, before sending and again after each backoff.
    Connectivity,
    Bypass,
}

/// Classified failure of one attempt, before it becomes a `RequestError`.
struct Failure {
    class: ErrorClass,
    status: Option<StatusCode>,
    body: Option<String>,
    message: String,
    unauthorized: bool,
}

impl Failure {
    fn bare(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            status: None,
            body: None,
            message: message.into(),
            unauthorized: false,
        }
    }

    fn from_response(response: &HttpResponse, policy: &RetryPolicy) -> Self {
        let body = response.text();
        let class = classify_status(response.status, &body, policy);
        let unauthorized = matches!(
            response.status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) || policy.mentions_credential(&body);
        Self {
            class,
            status: Some(response.status),
            body: Some(body),
            message: format!("HTTP {}", response.status.as_u16()),
            unauthorized,
        }
    }

    fn from_transport(err: TransportError, policy: &RetryPolicy) -> Self {
        let class = classify_transport(&err, policy);
        Self {
            class,
            status: None,
            body: None,
            message: err.message,
            unauthorized: class == ErrorClass::ClientRejected,
        }
    }

    fn into_error(self, host: String, attempts: u32) -> RequestError {
        RequestError {
            class: self.class,
            host,
            attempts,
            status: self.status,
            body: self.body,
            message: self.message,
            unauthorized: self.unauthorized,
        }
    }
}

fn parse_target(target: &str) -> Result<Url, RequestError> {
    match Url::parse(target) {
        Ok(url) if url.host_str().is_some() => Ok(url),
        Ok(_) => Err(RequestError::new(ErrorClass::Unknown, "<no-host>", 0, "target has no host")),
        Err(e) => Err(RequestError::new(
            ErrorClass::Unknown,
            "<invalid>",
            0,
            format!("invalid target url: {}", e),
        )),
    }
}

fn millis(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Assembles a [`ResilientClient`]; anything not supplied gets a default.
pub struct ClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    connectivity: Option<ConnectivityReader>,
    policy: RetryPolicy,
    observers: Vec<Arc<dyn RequestObserver>>,
    health_timeout: Duration,
    transport_config: TransportConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            scheduler: None,
            connectivity: None,
            policy: RetryPolicy::default(),
            observers: Vec::new(),
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            transport_config: TransportConfig::default(),
        }
    }

    /// Start from a loaded configuration file.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            policy: RetryPolicy::from(&config.retry),
            health_timeout: Duration::from_millis(config.health.timeout_ms),
            transport_config: config.transport.clone(),
            ..Self::new()
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn connectivity(mut self, reader: ConnectivityReader) -> Self {
        self.connectivity = Some(reader);
        self
    }

    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// Fails only when the default reqwest transport cannot be built.
    pub fn build(self) -> Result<ResilientClient, TransportError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.transport_config)?),
        };

        Ok(ResilientClient {
            transport,
            scheduler: self.scheduler.unwrap_or_else(|| Arc::new(TokioScheduler)),
            connectivity: self
                .connectivity
                .unwrap_or_else(ConnectivityReader::always_online),
            policy: Arc::new(ArcSwap::from_pointee(self.policy)),
            observers: self.observers.into(),
            health_timeout: self.health_timeout,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
