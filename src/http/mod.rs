//! Outbound HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! caller: request(target, RequestOptions, Option<&RetryPolicy>)
//!     → client.rs (connectivity gate, attempt loop, observers)
//!     → request.rs (per-attempt HttpRequest built from the options)
//!     → transport.rs (Transport trait; reqwest in production)
//!     → response.rs (buffered HttpResponse)
//!     → error.rs (one RequestError on terminal failure)
//! ```
//!
//! # Design Decisions
//! - The client is an explicit value, cloned cheaply, never a global
//! - The transport is a trait object so tests inject a scripted fake
//! - Only the target host ever reaches logs and errors

pub mod client;
pub mod error;
pub mod request;
pub mod response;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientBuilder, ResilientClient};
pub use error::RequestError;
pub use request::{HttpRequest, RequestOptions};
pub use response::HttpResponse;
pub use transport::{ReqwestTransport, Transport, TransportError, TransportErrorKind};
