//! Lightweight reachability probe.
//!
//! # Responsibilities
//! - Send one HEAD request to a same-origin URL under a short deadline
//! - Report the round-trip time on success
//!
//! # Design Decisions
//! - Any HTTP response proves a route exists, whatever its status
//! - Probes bypass the connectivity gate; they are how it recovers

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use reqwest::header::HeaderMap;
use reqwest::Method;
use thiserror::Error;
use url::Url;

use crate::http::request::HttpRequest;
use crate::http::transport::{Transport, TransportError};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("probe failed: {0}")]
    Transport(#[from] TransportError),
}

/// Something that can tell whether the network actually routes.
pub trait Probe: Send + Sync {
    /// Round-trip time on success.
    fn probe(&self) -> BoxFuture<'_, Result<Duration, ProbeError>>;
}

/// HEAD probe over a [`Transport`].
pub struct HttpProbe {
    transport: Arc<dyn Transport>,
    url: Url,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(transport: Arc<dyn Transport>, url: Url, timeout: Duration) -> Self {
        Self {
            transport,
            url,
            timeout,
        }
    }
}

impl Probe for HttpProbe {
    fn probe(&self) -> BoxFuture<'_, Result<Duration, ProbeError>> {
        Box::pin(async move {
            let request = HttpRequest {
                method: Method::HEAD,
                url: self.url.clone(),
                headers: HeaderMap::new(),
                body: None,
            };

            let started = Instant::now();
            match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
                Ok(Ok(_response)) => Ok(started.elapsed()),
                Ok(Err(e)) => Err(ProbeError::Transport(e)),
                Err(_) => Err(ProbeError::Timeout(self.timeout)),
            }
        })
    }
}

impl std::fmt::Debug for HttpProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProbe")
            .field("host", &self.url.host_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}
