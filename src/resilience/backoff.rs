//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Deterministic exponential delay: `base_ms × 2^retry`, capped at `max_ms`.
///
/// `retry` is the number of retries already performed for the current state,
/// so the first retry waits exactly `base_ms`.
pub fn backoff_delay(retry: u32, base_ms: u64, max_ms: u64) -> Duration {
    let exponential_base = 2u64.saturating_pow(retry);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    Duration::from_millis(delay_ms.min(max_ms))
}

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(retry: u32, base_ms: u64, max_ms: u64) -> Duration {
    let capped_delay = backoff_delay(retry, base_ms, max_ms).as_millis() as u64;

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}
