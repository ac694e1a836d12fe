//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! One logical request:
//!     → timeouts.rs (race the attempt against its deadline and the caller's signal)
//!     → classify.rs (tag the failed attempt with exactly one ErrorClass)
//!     → retries.rs (RetryPolicy: is the class retryable, is there budget left)
//!     → backoff.rs (fixed delay sequence, clamped to the last entry)
//!     → scheduler.rs (sleep through the injected scheduler)
//! ```
//!
//! # Design Decisions
//! - Retryability is a static lookup on the class, never on the attempt number
//! - Backoff is a configured sequence, not computed at runtime
//! - Caller cancellation is terminal; a timeout is an ordinary failure
//! - Sleeping goes through a trait so tests can observe delays without waiting

pub mod backoff;
pub mod classify;
pub mod retries;
pub mod scheduler;
pub mod timeouts;

pub use classify::ErrorClass;
pub use retries::RetryPolicy;
pub use scheduler::{Scheduler, TokioScheduler};

#[cfg(test)]
pub(crate) use scheduler::RecordingScheduler;
