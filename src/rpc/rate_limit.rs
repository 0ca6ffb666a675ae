//! Client-side call rate limiting.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A simple token bucket rate limiter.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    /// Take a token, or report how long until one is available.
    fn try_acquire(&mut self, now: Instant, capacity: f64, refill_rate: f64) -> Result<(), Duration> {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / refill_rate))
        }
    }
}

/// Limits outgoing node calls to `rate` per second with a burst of one.
#[derive(Debug)]
pub struct CallRateLimiter {
    bucket: Mutex<TokenBucket>,
    rate: f64,
}

impl CallRateLimiter {
    pub fn new(rate: f64) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(1.0)),
            rate,
        }
    }

    /// Wait until a call may proceed.
    pub async fn acquire(&self) {
        loop {
            let wait = match self.bucket.lock() {
                Ok(mut bucket) => bucket.try_acquire(Instant::now(), 1.0, self.rate),
                // A poisoned bucket only loses pacing, never calls.
                Err(_) => Ok(()),
            };
            match wait {
                Ok(()) => return,
                Err(delay) => tokio::time::sleep(delay).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_refills() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new(1.0);
        bucket.last_update = start;

        assert!(bucket.try_acquire(start, 1.0, 2.0).is_ok());
        let wait = bucket.try_acquire(start, 1.0, 2.0).unwrap_err();
        assert_eq!(wait, Duration::from_millis(500));

        assert!(bucket.try_acquire(start + Duration::from_millis(500), 1.0, 2.0).is_ok());
    }

    #[tokio::test]
    async fn test_limiter_paces_calls() {
        let limiter = CallRateLimiter::new(50.0);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(35));
    }
}
