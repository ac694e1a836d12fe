//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (binary):
//!     Load config → Init logging/metrics → Spawn monitor → Run command
//!
//! Shutdown (shutdown.rs):
//!     Signal received (signals.rs) → Shutdown::trigger → background tasks exit
//! ```
//!
//! # Design Decisions
//! - Background tasks (connectivity monitor, policy reload) each hold a
//!   shutdown receiver; requests in flight are left to finish on their own

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
