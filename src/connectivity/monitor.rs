//! Connectivity monitor.
//!
//! # Responsibilities
//! - Apply host online/offline signals and network hints
//! - Periodically probe to catch "falsely online" states
//! - Publish every transition through the connectivity writer
//!
//! # Design Decisions
//! - A host "offline" takes effect immediately, even while a probe is in flight
//! - The probe result is authoritative in both directions
//! - A closed host channel is not an error; the probe keeps running

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};

use crate::config::schema::ConnectivityConfig;
use crate::connectivity::probe::{Probe, ProbeError};
use crate::connectivity::state::{ConnectivityReader, ConnectivityWriter, NetworkHints, SignalSource};
use crate::observability::metrics;

type ProbeFuture = BoxFuture<'static, Result<Duration, ProbeError>>;

/// Signal delivered by the host environment.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Online,
    Offline,
    Hints(NetworkHints),
}

/// Background task that owns the connectivity writer.
pub struct ConnectivityMonitor {
    writer: ConnectivityWriter,
    probe: Option<Arc<dyn Probe>>,
    interval: Duration,
}

impl ConnectivityMonitor {
    pub fn new(writer: ConnectivityWriter, config: &ConnectivityConfig) -> Self {
        Self {
            writer,
            probe: None,
            interval: Duration::from_secs(config.probe_interval_secs.max(1)),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn Probe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn reader(&self) -> ConnectivityReader {
        self.writer.reader()
    }

    pub async fn run(
        self,
        mut host_events: mpsc::UnboundedReceiver<HostEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(
            probe = self.probe.is_some(),
            interval_secs = self.interval.as_secs(),
            "Connectivity monitor starting"
        );
        metrics::record_connectivity(self.writer.reader().is_online());

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut host_open = true;
        let mut in_flight: Option<ProbeFuture> = None;

        loop {
            tokio::select! {
                event = host_events.recv(), if host_open => match event {
                    Some(event) => self.apply_host_event(event),
                    None => {
                        tracing::debug!("Host signal source closed");
                        host_open = false;
                    }
                },
                _ = ticker.tick(), if self.probe.is_some() && in_flight.is_none() => {
                    in_flight = self.start_probe();
                }
                result = finish_probe(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    self.apply_probe_result(result);
                }
                _ = shutdown.recv() => {
                    tracing::info!("Connectivity monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn apply_host_event(&self, event: HostEvent) {
        match event {
            HostEvent::Online => self.transition(true, SignalSource::Host),
            HostEvent::Offline => self.transition(false, SignalSource::Host),
            HostEvent::Hints(hints) => {
                tracing::debug!(
                    effective_type = ?hints.effective_type,
                    downlink_mbps = ?hints.downlink_mbps,
                    rtt_ms = ?hints.rtt_ms,
                    "Network hints updated"
                );
                self.writer.set_hints(hints);
            }
        }
    }

    fn start_probe(&self) -> Option<ProbeFuture> {
        let probe = self.probe.clone()?;
        Some(Box::pin(async move { probe.probe().await }))
    }

    fn apply_probe_result(&self, result: Result<Duration, ProbeError>) {
        match result {
            Ok(rtt) => {
                let mut hints = self.writer.reader().snapshot().hints.clone();
                hints.rtt_ms = Some(u64::try_from(rtt.as_millis()).unwrap_or(u64::MAX));
                if self.writer.update(true, hints, SignalSource::Probe) {
                    tracing::info!(rtt_ms = rtt.as_millis() as u64, "Probe succeeded, back online");
                    metrics::record_connectivity(true);
                }
            }
            Err(e) => {
                if self.writer.set_online(false, SignalSource::Probe) {
                    tracing::warn!(error = %e, "Probe failed while reported online, marking offline");
                    metrics::record_connectivity(false);
                } else {
                    tracing::debug!(error = %e, "Probe failed, still offline");
                }
            }
        }
    }

    fn transition(&self, online: bool, source: SignalSource) {
        if self.writer.set_online(online, source) {
            tracing::info!(online, source = ?source, "Connectivity changed");
            metrics::record_connectivity(online);
        }
    }
}

/// Resolves with the in-flight probe's result; pending when none runs.
async fn finish_probe(in_flight: &mut Option<ProbeFuture>) -> Result<Duration, ProbeError> {
    match in_flight {
        Some(probe) => probe.await,
        None => std::future::pending().await,
    }
}
