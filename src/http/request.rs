//! Request description.
//!
//! # Responsibilities
//! - Carry the caller's fetch-style options (method, headers, body, signal)
//! - Produce the per-attempt request handed to the transport
//! - Reduce a target URL to the host form used in logs and errors

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Caller-supplied options, shaped like a standard fetch call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    /// Cancelling this token aborts the request and stops all retries.
    pub signal: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn signal(mut self, token: CancellationToken) -> Self {
        self.signal = Some(token);
        self
    }

    pub(crate) fn to_request(&self, url: &Url) -> HttpRequest {
        HttpRequest {
            method: self.method.clone(),
            url: url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

/// One attempt as seen by the transport.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// `host[:port]` of a URL; path and query never leave this function.
pub fn redacted_host(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => "<no-host>".to_string(),
    }
}
