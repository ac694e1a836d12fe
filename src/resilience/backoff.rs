//! Fixed-sequence backoff.

use std::time::Duration;

/// Delay to wait after failed attempt `attempt` (1-based) before the next one.
///
/// Attempts beyond the end of `schedule` reuse its last entry. An empty
/// schedule means retries go out back to back.
pub fn backoff_delay(schedule: &[Duration], attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    match schedule.last() {
        Some(last) => schedule
            .get(attempt as usize - 1)
            .copied()
            .unwrap_or(*last),
        None => Duration::ZERO,
    }
}

/// Build a schedule from millisecond values as they appear in config files.
pub fn schedule_from_millis(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_millis).collect()
}
