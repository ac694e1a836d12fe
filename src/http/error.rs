//! Request failure type.

use reqwest::StatusCode;
use thiserror::Error;

use crate::resilience::ErrorClass;

const MSG_CONNECTION: &str = "Unable to reach the server. Check your connection and try again.";
const MSG_NOT_AUTHORIZED: &str = "You are not authorized to perform this action.";
const MSG_REJECTED: &str = "The request was rejected by the server.";
const MSG_UNAVAILABLE: &str = "The service is unavailable right now. Please try again later.";
const MSG_CANCELLED: &str = "The request was cancelled.";

/// Terminal failure of one logical request.
///
/// Intermediate attempts never surface here; this is the outcome after the
/// budget ran out or a non-retryable class was hit.
#[derive(Debug, Clone, Error)]
#[error("{class} failure for {host} after {attempts} attempt(s): {message}")]
pub struct RequestError {
    pub class: ErrorClass,
    /// `host[:port]` of the target.
    pub host: String,
    /// Attempts actually issued; zero when the request never left.
    pub attempts: u32,
    pub status: Option<StatusCode>,
    /// Best-effort error body of the last response.
    pub body: Option<String>,
    pub message: String,
    /// The target rejected the caller's credentials.
    pub unauthorized: bool,
}

impl RequestError {
    pub(crate) fn new(class: ErrorClass, host: impl Into<String>, attempts: u32, message: impl Into<String>) -> Self {
        Self {
            class,
            host: host.into(),
            attempts,
            status: None,
            body: None,
            message: message.into(),
            unauthorized: false,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class.is_retryable()
    }

    /// Text for the layer that shows errors to people.
    pub fn user_message(&self) -> &'static str {
        match self.class {
            ErrorClass::Network | ErrorClass::Cors => MSG_CONNECTION,
            ErrorClass::Cancelled => MSG_CANCELLED,
            ErrorClass::ClientRejected if self.unauthorized => MSG_NOT_AUTHORIZED,
            ErrorClass::ClientRejected => MSG_REJECTED,
            ErrorClass::Timeout | ErrorClass::ServerError | ErrorClass::Unknown => MSG_UNAVAILABLE,
        }
    }
}
