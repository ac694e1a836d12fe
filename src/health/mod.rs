//! Health checking and troubleshooting.
//!
//! # Data Flow
//! ```text
//! health_check (check.rs):
//!     Named targets
//!     → One single-attempt request each, concurrently
//!     → Map of name → HealthReport
//!
//! diagnose (troubleshoot.rs):
//!     Connectivity snapshot + health_check results
//!     → Suggestions for the person at the keyboard
//! ```
//!
//! # Design Decisions
//! - Checks never fail as a whole; every target gets a report
//! - Checks share the classifier and default policy of normal requests but
//!   skip the offline gate, so every target gets exactly one attempt

pub mod check;
pub mod troubleshoot;

pub use check::{HealthReport, HealthStatus, HealthTarget};
pub use troubleshoot::TroubleshootReport;
