//! Token bucket pacing for API calls.
//!
//! Calls are sequential, so the concurrency semaphore only guards against a
//! handler that fans out. The bucket is what keeps bulk loops under the
//! provider's quota.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tokio::time::sleep;
use anyhow::{Context, Result};
use tracing::debug;

#[derive(Debug)]
struct Bucket {
    tokens: usize,
    last_refill: Instant,
}

/// A token bucket rate limiter combined with a concurrency limit
#[derive(Debug)]
pub struct RateLimiter {
    capacity: usize,
    period: Duration,
    bucket: Mutex<Bucket>,
    concurrency_limit: Arc<Semaphore>,
}

impl RateLimiter {
    /// Creates a new rate limiter
    ///
    /// # Arguments
    ///
    /// * `requests_per_period` - Tokens added every period (and bucket size)
    /// * `period_ms` - Refill period in milliseconds
    /// * `max_concurrent` - Maximum number of requests in flight
    pub fn new(requests_per_period: usize, period_ms: u64, max_concurrent: usize) -> Self {
        Self {
            capacity: requests_per_period.max(1),
            period: Duration::from_millis(period_ms.max(1)),
            bucket: Mutex::new(Bucket {
                tokens: requests_per_period.max(1),
                last_refill: Instant::now(),
            }),
            concurrency_limit: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Waits for a token, then for a concurrency permit.
    ///
    /// The permit is released when the returned guard is dropped.
    pub async fn acquire(&self) -> Result<RateLimitGuard> {
        loop {
            let wait = self.try_acquire().await;
            if wait.is_zero() {
                break;
            }
            debug!("rate limit reached, waiting {:?}", wait);
            sleep(wait).await;
        }

        let permit = self
            .concurrency_limit
            .clone()
            .acquire_owned()
            .await
            .context("Failed to acquire concurrency permit")?;

        Ok(RateLimitGuard { _permit: permit })
    }

    async fn try_acquire(&self) -> Duration {
        let mut bucket = self.bucket.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill);

        if elapsed >= self.period {
            let periods = (elapsed.as_millis() / self.period.as_millis()) as usize;
            bucket.tokens = (bucket.tokens + periods * self.capacity).min(self.capacity);
            let remainder = elapsed.as_millis() % self.period.as_millis();
            bucket.last_refill = now - Duration::from_millis(remainder as u64);
        }

        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            Duration::ZERO
        } else {
            self.period
                .saturating_sub(now.duration_since(bucket.last_refill))
                .max(Duration::from_millis(1))
        }
    }
}

/// Releases the concurrency permit when dropped
#[derive(Debug)]
pub struct RateLimitGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

/// General API pacing: bursts are fine, sustained loops stay under quota.
pub fn api_limiter() -> RateLimiter {
    RateLimiter::new(20, 1_000, 4)
}

/// One call per second, for the admin settings family.
pub fn admin_settings_limiter() -> RateLimiter {
    RateLimiter::new(1, 1_000, 1)
}
