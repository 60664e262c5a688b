//! Shard start-rate throttling

use std::time::Duration;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Delay between two shard starts
///
/// `window` is spread evenly over `max_concurrency` starts, rounded to whole
/// seconds and never below one second. A `max_concurrency` of zero counts as one.
#[must_use]
pub fn start_interval(max_concurrency: u32, window: Duration) -> Duration {
    let concurrency = f64::from(max_concurrency.max(1));
    let secs = (window.as_secs_f64() / concurrency).round();
    Duration::from_secs_f64(secs).max(MIN_INTERVAL)
}
