//! Shared connectivity state.
//!
//! # States
//! - Online: requests are attempted
//! - Offline: requests fail fast with a `network` classification
//!
//! # Design Decisions
//! - `ConnectivityWriter` is not `Clone`; the monitor owns it
//! - Each write stores a fresh `Arc<ConnectivitySnapshot>` through `ArcSwap`
//! - Subscribers hear only about online/offline transitions, not hint updates

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};

const EVENT_CAPACITY: usize = 16;

/// Where the current value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Initial,
    Host,
    Probe,
}

/// Latency and throughput hints, when the host provides them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkHints {
    pub effective_type: Option<String>,
    pub downlink_mbps: Option<f64>,
    pub rtt_ms: Option<u64>,
}

/// Point-in-time connectivity view.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivitySnapshot {
    pub is_online: bool,
    pub hints: NetworkHints,
    pub source: SignalSource,
    #[serde(skip)]
    pub changed_at: Instant,
}

impl ConnectivitySnapshot {
    fn initial() -> Self {
        Self {
            is_online: true,
            hints: NetworkHints::default(),
            source: SignalSource::Initial,
            changed_at: Instant::now(),
        }
    }
}

/// Notification sent on every online/offline transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivityEvent {
    pub is_online: bool,
    pub source: SignalSource,
}

#[derive(Debug)]
struct Shared {
    snapshot: ArcSwap<ConnectivitySnapshot>,
    events: broadcast::Sender<ConnectivityEvent>,
}

/// Create the single writer and a reader for a fresh "online" state.
pub fn connectivity_channel() -> (ConnectivityWriter, ConnectivityReader) {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    let shared = Arc::new(Shared {
        snapshot: ArcSwap::from_pointee(ConnectivitySnapshot::initial()),
        events,
    });
    (
        ConnectivityWriter {
            shared: shared.clone(),
        },
        ConnectivityReader { shared },
    )
}

/// The only handle allowed to change connectivity.
#[derive(Debug)]
pub struct ConnectivityWriter {
    shared: Arc<Shared>,
}

impl ConnectivityWriter {
    /// Flip the online flag, keeping the current hints.
    ///
    /// Returns true when the value changed.
    pub fn set_online(&self, online: bool, source: SignalSource) -> bool {
        let hints = self.shared.snapshot.load().hints.clone();
        self.update(online, hints, source)
    }

    /// Replace the hints without touching the online flag.
    pub fn set_hints(&self, hints: NetworkHints) {
        let current = self.shared.snapshot.load_full();
        self.shared.snapshot.store(Arc::new(ConnectivitySnapshot {
            is_online: current.is_online,
            hints,
            source: current.source,
            changed_at: current.changed_at,
        }));
    }

    /// Write the flag and hints together.
    ///
    /// Returns true when the online flag changed, in which case subscribers
    /// are notified.
    pub fn update(&self, online: bool, hints: NetworkHints, source: SignalSource) -> bool {
        let current = self.shared.snapshot.load_full();
        let changed = current.is_online != online;
        self.shared.snapshot.store(Arc::new(ConnectivitySnapshot {
            is_online: online,
            hints,
            source: if changed { source } else { current.source },
            changed_at: if changed { Instant::now() } else { current.changed_at },
        }));

        if changed {
            // No subscribers is fine.
            let _ = self.shared.events.send(ConnectivityEvent {
                is_online: online,
                source,
            });
        }
        changed
    }

    pub fn reader(&self) -> ConnectivityReader {
        ConnectivityReader {
            shared: self.shared.clone(),
        }
    }
}

/// Read-only view shared by any number of requests.
#[derive(Debug, Clone)]
pub struct ConnectivityReader {
    shared: Arc<Shared>,
}

impl ConnectivityReader {
    /// A reader with no writer behind it: permanently online.
    pub fn always_online() -> Self {
        let (_writer, reader) = connectivity_channel();
        reader
    }

    pub fn is_online(&self) -> bool {
        self.shared.snapshot.load().is_online
    }

    pub fn snapshot(&self) -> Arc<ConnectivitySnapshot> {
        self.shared.snapshot.load_full()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.shared.events.subscribe()
    }

    /// Hand every transition to `on_event` until `stop` resolves.
    ///
    /// `stop` is polled as one future for the whole run, so a signal that
    /// fires between two transitions is not lost.
    pub async fn follow<S>(&self, stop: S, mut on_event: impl FnMut(ConnectivityEvent))
    where
        S: Future<Output = ()>,
    {
        let mut events = self.subscribe();
        tokio::pin!(stop);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => on_event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Connectivity events lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = &mut stop => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_online() {
        let (_writer, reader) = connectivity_channel();
        assert!(reader.is_online());
        assert_eq!(reader.snapshot().source, SignalSource::Initial);
        assert!(ConnectivityReader::always_online().is_online());
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_stops_under_steady_transitions() {
        let (writer, reader) = connectivity_channel();
        let flapper = tokio::spawn(async move {
            for n in 0..100 {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                writer.set_online(n % 2 == 1, SignalSource::Host);
            }
        });

        let started = tokio::time::Instant::now();
        let mut seen = Vec::new();
        let stop = tokio::time::sleep(std::time::Duration::from_millis(55));
        reader.follow(stop, |event| seen.push(event)).await;

        assert!(started.elapsed() < std::time::Duration::from_millis(100));
        assert!(!seen.is_empty());
        assert!(!seen[0].is_online);
        flapper.abort();
    }

    #[tokio::test]
    async fn test_transition_notifies_subscribers() {
        let (writer, reader) = connectivity_channel();
        let mut events = reader.subscribe();

        assert!(writer.set_online(false, SignalSource::Host));
        assert!(!reader.is_online());

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            ConnectivityEvent {
                is_online: false,
                source: SignalSource::Host
            }
        );
    }

    #[test]
    fn test_repeated_value_is_not_a_transition() {
        let (writer, reader) = connectivity_channel();
        let mut events = reader.subscribe();

        assert!(!writer.set_online(true, SignalSource::Probe));
        assert!(events.try_recv().is_err());
        assert_eq!(reader.snapshot().source, SignalSource::Initial);
    }

    #[test]
    fn test_flag_and_hints_written_together() {
        let (writer, reader) = connectivity_channel();
        let hints = NetworkHints {
            effective_type: Some("3g".into()),
            downlink_mbps: Some(1.5),
            rtt_ms: Some(300),
        };

        writer.update(false, hints.clone(), SignalSource::Host);
        let snapshot = reader.snapshot();
        assert!(!snapshot.is_online);
        assert_eq!(snapshot.hints, hints);

        writer.set_hints(NetworkHints::default());
        let snapshot = reader.snapshot();
        assert!(!snapshot.is_online);
        assert_eq!(snapshot.hints, NetworkHints::default());
    }
}
