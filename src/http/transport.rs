//! Transport abstraction.
//!
//! # Responsibilities
//! - Send one request and buffer its response
//! - Report failures as a [`TransportError`] with a coarse kind
//!
//! # Design Decisions
//! - Non-2xx bodies are read best-effort; a failed read yields an empty body
//! - Error messages are stripped of URLs before they leave the transport

use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::config::schema::TransportConfig;
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;

/// Coarse reason a transport call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection could not be established or the request was not sent.
    Connect,
    /// The transport's own deadline fired.
    Timeout,
    /// The response body could not be read.
    Body,
    Other,
}

/// Failure of a single transport call.
#[derive(Debug, Clone, Error)]
#[error("{kind:?} error: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() || err.is_request() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, err.without_url().to_string())
    }
}

/// Anything that can carry one HTTP exchange.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>>;
}

/// Production transport over a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method, request.url)
                .headers(request.headers);
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = match response.bytes().await {
                Ok(bytes) => bytes.to_vec(),
                Err(e) if status.is_success() => return Err(e.into()),
                Err(_) => Vec::new(),
            };

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        })
    }
}
