//! Timeout enforcement.
//!
//! # Responsibilities
//! - Race one attempt against its deadline and the caller's cancellation
//! - Let backoff sleeps be interrupted by the caller's cancellation
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; no guard task is spawned
//! - Cancellation is checked first so an already-cancelled token never
//!   lets another attempt start

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// How a guarded attempt ended.
#[derive(Debug)]
pub enum Guarded<T> {
    Completed(T),
    TimedOut,
    Cancelled,
}

/// Run `fut` until it completes, `deadline` elapses or `signal` fires.
pub async fn run_guarded<F>(
    fut: F,
    deadline: Duration,
    signal: Option<&CancellationToken>,
) -> Guarded<F::Output>
where
    F: Future,
{
    let timed = tokio::time::timeout(deadline, fut);
    match signal {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Guarded::Cancelled,
            res = timed => res.map_or(Guarded::TimedOut, Guarded::Completed),
        },
        None => timed.await.map_or(Guarded::TimedOut, Guarded::Completed),
    }
}

/// Run `fut` to completion unless `signal` fires first.
pub async fn until_cancelled<F>(fut: F, signal: Option<&CancellationToken>) -> Option<F::Output>
where
    F: Future,
{
    match signal {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => None,
            out = fut => Some(out),
        },
        None => Some(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_wins_over_slow_future() {
        let slow = tokio::time::sleep(Duration::from_secs(60));
        let out = run_guarded(slow, Duration::from_secs(1), None).await;
        assert!(matches!(out, Guarded::TimedOut));
    }

    #[tokio::test]
    async fn test_fast_future_completes() {
        let out = run_guarded(async { 7 }, Duration::from_secs(1), None).await;
        assert!(matches!(out, Guarded::Completed(7)));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let out = run_guarded(async { 7 }, Duration::from_secs(1), Some(&token)).await;
        assert!(matches!(out, Guarded::Cancelled));

        let waited = until_cancelled(std::future::pending::<()>(), Some(&token)).await;
        assert!(waited.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_wait() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let out = run_guarded(
            std::future::pending::<()>(),
            Duration::from_secs(30),
            Some(&token),
        )
        .await;
        assert!(matches!(out, Guarded::Cancelled));
    }
}
