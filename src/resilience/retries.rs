//! Retry policy.
//!
//! # Responsibilities
//! - Bound retries per step and restarts per attempt
//! - Compute the delay before the next retry

use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::{backoff_delay, calculate_backoff};

/// Bounds and timing for retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub max_restarts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        if self.jitter {
            calculate_backoff(retry, self.base_delay_ms, self.max_delay_ms)
        } else {
            backoff_delay(retry, self.base_delay_ms, self.max_delay_ms)
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            max_restarts: config.max_restarts,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            jitter: config.jitter,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_config() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay_ms: 50,
            max_delay_ms: 400,
            max_restarts: 1,
            jitter: false,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.delay_for(0), Duration::from_millis(50));
        assert_eq!(policy.delay_for(4), Duration::from_millis(400));
    }
}
