//! Fixed-interval rate limiter for the Slack Web API.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum spacing between Slack Web API calls, tuned to the published Tier 3
/// limit (~50 requests/minute). No burst allowance, no adaptive backoff.
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 1100;

/// Enforces a minimum interval between permits. The rate limit is global to
/// the credential, so one instance is shared by everything that talks to it.
pub struct RateLimiter {
    min_interval: Duration,
    last_permit: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_permit: Mutex::new(None),
        }
    }

    /// Suspend until at least the minimum interval has passed since the
    /// previous permit. The lock is held across the sleep so concurrent
    /// callers queue up behind a single shared gate.
    pub async fn wait(&self) {
        let mut last = self.last_permit.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_MIN_INTERVAL_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn spaces_consecutive_permits() {
        let limiter = RateLimiter::new(Duration::from_millis(1100));
        let start = Instant::now();

        limiter.wait().await;
        let first = start.elapsed();
        limiter.wait().await;
        let second = start.elapsed();

        // First permit passes immediately, second waits out the interval.
        assert!(first < Duration::from_millis(100));
        assert!(second >= Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn no_wait_after_interval_elapsed() {
        let limiter = RateLimiter::new(Duration::from_millis(200));
        limiter.wait().await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        let before = Instant::now();
        limiter.wait().await;
        assert!(before.elapsed() < Duration::from_millis(50));
    }
}
