//! Explicit retry policy with a jittered backoff distribution.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// Retry policy for [`super::RetryingFetcher`].
///
/// Defaults match the marketplace etiquette the pipeline was tuned
/// for: up to 3 attempts, a uniform 1-3 s delay before each, and a
/// 30 s per-attempt request timeout.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Must be >= 1.
    pub max_attempts: u32,

    /// Lower bound of the uniform pre-attempt delay.
    pub min_delay: Duration,

    /// Upper bound of the uniform pre-attempt delay.
    pub max_delay: Duration,

    /// Per-attempt request timeout (handed to the transport).
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Set the attempt count.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the pre-attempt delay range.
    pub fn with_delay_range(mut self, min: Duration, max: Duration) -> Self {
        self.min_delay = min;
        self.max_delay = max.max(min);
        self
    }

    /// Sample the delay to sleep before the next attempt.
    pub fn next_delay(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        let range = (self.max_delay - self.min_delay).as_millis() as u64;
        let jitter = rand::thread_rng().gen_range(0..=range);
        self.min_delay + Duration::from_millis(jitter)
    }
}

/// Sleeping seam so retry timing is testable with a no-op clock.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
