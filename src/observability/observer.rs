//! Request observers.
//!
//! # Responsibilities
//! - Define the events a request emits while it runs
//! - Define the sink trait that logging, metrics and diagnostics implement
//!
//! # Design Decisions
//! - Observers are side channels; they receive borrowed records and return
//!   nothing, so they cannot steer a request
//! - Every method has an empty default, so a sink implements only what it uses

use serde::Serialize;
use uuid::Uuid;

use crate::resilience::ErrorClass;

/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failed(ErrorClass),
}

/// One attempt of one logical request.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub request_id: Uuid,
    pub host: String,
    pub attempt: u32,
    pub elapsed_ms: u64,
    pub outcome: AttemptOutcome,
    pub status: Option<u16>,
}

/// Final result of one logical request.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRecord {
    pub request_id: Uuid,
    pub host: String,
    pub attempts: u32,
    pub elapsed_ms: u64,
    pub status: Option<u16>,
    /// `None` on success.
    pub error: Option<ErrorClass>,
}

impl OutcomeRecord {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Sink for request diagnostics.
pub trait RequestObserver: Send + Sync {
    /// Called once per attempt after its outcome is known.
    fn on_attempt(&self, _record: &AttemptRecord) {}

    /// Called once per failed attempt with its classification.
    fn on_classify(&self, _record: &AttemptRecord, _class: ErrorClass) {}

    /// Called once per logical request with its final result.
    fn on_outcome(&self, _outcome: &OutcomeRecord) {}
}
