//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! ResilientClient emits (observer.rs):
//!     on_attempt / on_classify / on_outcome
//!     → logging.rs (TracingObserver: structured log events)
//!     → metrics.rs (MetricsObserver: counters, histograms)
//!     → diagnostics.rs (DiagnosticsRecorder: counts + recent attempts)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Prometheus scrape endpoint (optional)
//!     → DiagnosticsRecorder::summary() on demand
//! ```
//!
//! # Design Decisions
//! - Observers are opt-in; a client with none behaves identically
//! - The library never installs a subscriber or exporter; the binary does
//! - Hosts appear in labels and fields; full URLs never do

pub mod diagnostics;
pub mod logging;
pub mod metrics;
pub mod observer;

pub use diagnostics::{DiagnosticsRecorder, DiagnosticsSummary};
pub use logging::TracingObserver;
pub use metrics::MetricsObserver;
pub use observer::{AttemptOutcome, AttemptRecord, OutcomeRecord, RequestObserver};
