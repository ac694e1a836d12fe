//! Connectivity subsystem.
//!
//! # Data Flow
//! ```text
//! Host signals (online/offline/hints):
//!     HostEvent over mpsc
//!     → monitor.rs
//!     → state.rs (ConnectivityWriter swaps the snapshot, broadcasts the change)
//!
//! Periodic probe (probe.rs):
//!     Interval tick
//!     → HEAD against a same-origin URL
//!     → state.rs (corrects "falsely online", records rtt)
//!
//! Readers (request client, troubleshooting):
//!     ConnectivityReader::is_online() / snapshot() / subscribe()
//! ```
//!
//! # Design Decisions
//! - Exactly one writer; readers are lock-free and never block it
//! - The boolean and its hints are replaced together as one snapshot
//! - Without any host signal source the state stays "online"

pub mod monitor;
pub mod probe;
pub mod state;

pub use monitor::{ConnectivityMonitor, HostEvent};
pub use probe::{HttpProbe, Probe, ProbeError};
pub use state::{
    connectivity_channel, ConnectivityEvent, ConnectivityReader, ConnectivitySnapshot,
    ConnectivityWriter, NetworkHints, SignalSource,
};
