//! Backoff scheduling.

use std::time::Duration;

use futures_util::future::BoxFuture;

/// Source of the sleeps inserted between attempts.
pub trait Scheduler: Send + Sync {
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()>;
}

/// Real-time scheduler backed by the Tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(delay))
    }
}

#[cfg(test)]
pub(crate) use recording::RecordingScheduler;


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_recording_scheduler_records_and_runs_hook() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let scheduler = RecordingScheduler::with_hook(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        scheduler.sleep(Duration::from_millis(5)).await;
        scheduler.sleep(Duration::from_millis(7)).await;

        assert_eq!(
            scheduler.delays(),
            vec![Duration::from_millis(5), Duration::from_millis(7)]
        );
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_waits() {
        let start = tokio::time::Instant::now();
        TokioScheduler.sleep(Duration::from_secs(2)).await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
