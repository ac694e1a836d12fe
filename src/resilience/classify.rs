//! Failure classification.
//!
//! # Responsibilities
//! - Map a non-2xx response to an [`ErrorClass`] using its structured status
//! - Map a transport failure to an [`ErrorClass`] using its error kind
//! - Answer "may this class be retried" with a static lookup
//!
//! # Design Decisions
//! - Status codes are inspected as numbers, never as message text
//! - Message inspection is limited to two best-effort signals: cross-origin
//!   rejections and credential markers supplied by the target

use std::fmt;

use reqwest::StatusCode;
use serde::Serialize;

use crate::http::transport::{TransportError, TransportErrorKind};
use crate::resilience::retries::RetryPolicy;

/// Taxonomy tag attached to every failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErrorClass {
    /// The call never reached a server, or the host is offline.
    #[serde(rename = "network")]
    Network,
    /// The attempt exceeded its deadline.
    #[serde(rename = "timeout")]
    Timeout,
    /// Blocked by cross-origin policy.
    #[serde(rename = "cors")]
    Cors,
    /// Rejected by the target in a way a retry cannot fix.
    #[serde(rename = "http-4xx-nonretryable")]
    ClientRejected,
    /// Server-side or transient HTTP failure.
    #[serde(rename = "http-5xx-retryable")]
    ServerError,
    /// Aborted by the caller.
    #[serde(rename = "cancelled")]
    Cancelled,
    /// Anything that fits nowhere else.
    #[serde(rename = "unknown")]
    Unknown,
}

impl ErrorClass {
    pub const ALL: [ErrorClass; 7] = [
        ErrorClass::Network,
        ErrorClass::Timeout,
        ErrorClass::Cors,
        ErrorClass::ClientRejected,
        ErrorClass::ServerError,
        ErrorClass::Cancelled,
        ErrorClass::Unknown,
    ];

    /// Whether another attempt could plausibly succeed.
    pub const fn is_retryable(self) -> bool {
        match self {
            ErrorClass::Network
            | ErrorClass::Timeout
            | ErrorClass::ServerError
            | ErrorClass::Unknown => true,
            ErrorClass::Cors | ErrorClass::ClientRejected | ErrorClass::Cancelled => false,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Network => "network",
            ErrorClass::Timeout => "timeout",
            ErrorClass::Cors => "cors",
            ErrorClass::ClientRejected => "http-4xx-nonretryable",
            ErrorClass::ServerError => "http-5xx-retryable",
            ErrorClass::Cancelled => "cancelled",
            ErrorClass::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a non-2xx response.
pub fn classify_status(status: StatusCode, body: &str, policy: &RetryPolicy) -> ErrorClass {
    let code = status.as_u16();
    if policy.non_retryable_statuses.contains(&code) || policy.mentions_credential(body) {
        return ErrorClass::ClientRejected;
    }

    match code {
        408 => ErrorClass::Timeout,
        429 | 500..=599 => ErrorClass::ServerError,
        400..=499 => ErrorClass::ClientRejected,
        _ => ErrorClass::Unknown,
    }
}

/// Classify a failure raised before any response arrived.
pub fn classify_transport(err: &TransportError, policy: &RetryPolicy) -> ErrorClass {
    if looks_like_cors(&err.message) {
        return ErrorClass::Cors;
    }
    if policy.mentions_credential(&err.message) {
        return ErrorClass::ClientRejected;
    }

    match err.kind {
        TransportErrorKind::Connect => ErrorClass::Network,
        TransportErrorKind::Timeout => ErrorClass::Timeout,
        TransportErrorKind::Body | TransportErrorKind::Other => ErrorClass::Unknown,
    }
}

fn looks_like_cors(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("cors") || lower.contains("cross-origin")
}
