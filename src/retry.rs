//! Exponential backoff for transient provider failures.
//!
//! The provider answers overload with HTTP 503/429 or a `ServerBusy` reason.
//! Those, plus connection failures and timeouts, are retried; every other
//! error is returned on the first attempt.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::error::GamError;

/// Backoff parameters.
///
/// # Examples
///
/// ```
/// use gam::retry::RetryConfig;
///
/// let config = RetryConfig { add_jitter: false, ..RetryConfig::default() };
/// assert_eq!(config.delay_ms(0), 100);
/// assert_eq!(config.delay_ms(1), 200);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub backoff_factor: f64,
    pub max_backoff_ms: u64,
    /// Scale each delay by a random factor in 0.9..1.1
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            backoff_factor: 2.0,
            max_backoff_ms: 10_000,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `retry` (zero based), capped at `max_backoff_ms`.
    pub fn delay_ms(&self, retry: u32) -> u64 {
        let base = self.initial_backoff_ms as f64 * self.backoff_factor.powi(retry as i32);
        let scaled = if self.add_jitter {
            base * (rand::random::<f64>() * 0.2 + 0.9)
        } else {
            base
        };
        (scaled as u64).min(self.max_backoff_ms)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retriable error,
/// or `config.max_retries` attempts have been made.
///
/// # Examples
///
/// ```
/// use gam::retry::{RetryConfig, with_exponential_backoff};
///
/// # async fn example() -> anyhow::Result<()> {
/// let value = with_exponential_backoff(
///     || async { Ok::<_, anyhow::Error>(7) },
///     |_| true,
///     &RetryConfig::default(),
/// ).await?;
/// assert_eq!(value, 7);
/// # Ok(())
/// # }
/// ```
pub async fn with_exponential_backoff<F, Fut, T, E, R>(
    operation: F,
    is_retriable: R,
    config: &RetryConfig,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= config.max_retries || !is_retriable(&err) {
                    return Err(err);
                }
                let delay = config.delay_ms(attempt - 1);
                debug!("retry {}/{} in {}ms", attempt, config.max_retries, delay);
                sleep(Duration::from_millis(delay)).await;
            }
        }
    }
}

/// Retry predicate for transport errors.
pub fn is_transient(err: &GamError) -> bool {
    match err {
        GamError::Api(api) => api.is_transient(),
        GamError::Http(e) => e.is_timeout() || e.is_connect(),
        _ => false,
    }
}
