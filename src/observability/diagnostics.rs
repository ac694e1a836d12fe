//! On-demand request diagnostics.
//!
//! # Responsibilities
//! - Count requests, attempts and failures, per class and per host
//! - Keep a bounded window of the most recent attempts
//! - Render a human-readable summary
//!
//! # Design Decisions
//! - Counters are atomics; only the recent window takes a lock
//! - Nothing is persisted; the summary is a snapshot, not a format

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use serde::Serialize;

use crate::observability::observer::{AttemptOutcome, AttemptRecord, OutcomeRecord, RequestObserver};
use crate::resilience::ErrorClass;

/// Per-host request counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostStats {
    pub requests: u64,
    pub failures: u64,
}

/// Snapshot returned by [`DiagnosticsRecorder::summary`].
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsSummary {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub attempts: u64,
    pub errors_by_class: BTreeMap<String, u64>,
    pub hosts: BTreeMap<String, HostStats>,
    /// Oldest first.
    pub recent: Vec<AttemptRecord>,
}

/// Observer that aggregates request events in memory.
#[derive(Debug)]
pub struct DiagnosticsRecorder {
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    attempts: AtomicU64,
    by_class: DashMap<ErrorClass, u64>,
    by_host: DashMap<String, HostStats>,
    recent: Mutex<VecDeque<AttemptRecord>>,
    capacity: usize,
}

impl DiagnosticsRecorder {
    /// `capacity` bounds the recent-attempt window.
    pub fn new(capacity: usize) -> Self {
        Self {
            requests: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            attempts: AtomicU64::new(0),
            by_class: DashMap::new(),
            by_host: DashMap::new(),
            recent: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn summary(&self) -> DiagnosticsSummary {
        let errors_by_class = self
            .by_class
            .iter()
            .map(|entry| (entry.key().to_string(), *entry.value()))
            .collect();
        let hosts = self
            .by_host
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let recent = self
            .recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();

        DiagnosticsSummary {
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            errors_by_class,
            hosts,
            recent,
        }
    }
}

impl Default for DiagnosticsRecorder {
    fn default() -> Self {
        Self::new(50)
    }
}

impl RequestObserver for DiagnosticsRecorder {
    fn on_attempt(&self, record: &AttemptRecord) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if self.capacity == 0 {
            return;
        }
        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        if recent.len() == self.capacity {
            recent.pop_front();
        }
        recent.push_back(record.clone());
    }

    fn on_classify(&self, _record: &AttemptRecord, class: ErrorClass) {
        *self.by_class.entry(class).or_insert(0) += 1;
    }

    fn on_outcome(&self, outcome: &OutcomeRecord) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let mut host = self.by_host.entry(outcome.host.clone()).or_default();
        host.requests += 1;
        if outcome.is_success() {
            self.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
            host.failures += 1;
        }
    }
}

impl fmt::Display for DiagnosticsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "requests: {} ({} ok, {} failed), attempts: {}",
            self.requests, self.successes, self.failures, self.attempts
        )?;

        if !self.errors_by_class.is_empty() {
            writeln!(f, "errors by class:")?;
            for (class, count) in &self.errors_by_class {
                writeln!(f, "  {:<24} {}", class, count)?;
            }
        }

        if !self.hosts.is_empty() {
            writeln!(f, "hosts:")?;
            for (host, stats) in &self.hosts {
                writeln!(f, "  {:<32} {} requests, {} failed", host, stats.requests, stats.failures)?;
            }
        }

        if !self.recent.is_empty() {
            writeln!(f, "recent attempts:")?;
            for record in &self.recent {
                let outcome = match record.outcome {
                    AttemptOutcome::Success => "ok".to_string(),
                    AttemptOutcome::Failed(class) => class.to_string(),
                };
                let status = record
                    .status
                    .map_or_else(|| "-".to_string(), |s| s.to_string());
                writeln!(
                    f,
                    "  {} #{} {} status={} {}ms",
                    record.host, record.attempt, outcome, status, record.elapsed_ms
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn attempt(host: &str, n: u32, outcome: AttemptOutcome) -> AttemptRecord {
        AttemptRecord {
            request_id: Uuid::nil(),
            host: host.to_string(),
            attempt: n,
            elapsed_ms: 5,
            outcome,
            status: None,
        }
    }

    fn outcome(host: &str, error: Option<ErrorClass>) -> OutcomeRecord {
        OutcomeRecord {
            request_id: Uuid::nil(),
            host: host.to_string(),
            attempts: 1,
            elapsed_ms: 5,
            status: None,
            error,
        }
    }

    #[test]
    fn test_counts_by_class_and_host() {
        let recorder = DiagnosticsRecorder::new(10);
        let failed = attempt("a.test", 1, AttemptOutcome::Failed(ErrorClass::Timeout));
        recorder.on_classify(&failed, ErrorClass::Timeout);
        recorder.on_attempt(&failed);
        recorder.on_outcome(&outcome("a.test", Some(ErrorClass::Timeout)));
        recorder.on_attempt(&attempt("b.test", 1, AttemptOutcome::Success));
        recorder.on_outcome(&outcome("b.test", None));

        let summary = recorder.summary();
        assert_eq!(summary.requests, 2);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.successes, 1);
        assert_eq!(summary.errors_by_class.get("timeout"), Some(&1));
        assert_eq!(
            summary.hosts.get("a.test"),
            Some(&HostStats {
                requests: 1,
                failures: 1
            })
        );
    }

    #[test]
    fn test_recent_window_is_bounded() {
        let recorder = DiagnosticsRecorder::new(2);
        for n in 1..=3 {
            recorder.on_attempt(&attempt("a.test", n, AttemptOutcome::Success));
        }

        let summary = recorder.summary();
        assert_eq!(summary.attempts, 3);
        let kept: Vec<u32> = summary.recent.iter().map(|r| r.attempt).collect();
        assert_eq!(kept, vec![2, 3]);
    }

    #[test]
    fn test_display() {
        let recorder = DiagnosticsRecorder::default();
        recorder.on_attempt(&attempt("a.test", 1, AttemptOutcome::Success));
        recorder.on_outcome(&outcome("a.test", None));

        let text = recorder.summary().to_string();
        assert!(text.contains("requests: 1 (1 ok, 0 failed), attempts: 1"));
        assert!(text.contains("a.test"));
    }
}
