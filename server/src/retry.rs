use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::Result;

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Extra attempts after the first failure. 0 means fail fast.
    max_retries: u32,
    /// Base delay for exponential backoff.
    base_delay_ms: u64,
    /// Maximum jitter to add to backoff delay (as fraction of delay, e.g., 0.25 = ±25%).
    jitter_factor: f64,
}

impl RetryConfig {
    pub fn new(max_retries: u32) -> Self {
        RetryConfig {
            max_retries,
            ..RetryConfig::default()
        }
    }

    pub fn fail_fast() -> Self {
        RetryConfig::new(0)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: 0,
            base_delay_ms: 500,
            jitter_factor: 0.25,
        }
    }
}

/// Run `func` until it succeeds, fails with a non-retryable error, or
/// the retry budget is spent. Returns the last error.
pub async fn with_retry<F, Fut, T>(func: F, config: &RetryConfig) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match func().await {
            Ok(result) => return Ok(result),
            Err(err) if err.is_retryable() && attempt < config.max_retries => {
                log::warn!("Retryable error: {}", err);
                let delay = backoff_with_jitter(attempt, config);
                log::warn!(
                    "Retry attempt {}/{} after {:?}",
                    attempt + 1,
                    config.max_retries,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Exponential backoff `base_delay * 2^attempt` with ±`jitter_factor` noise.
fn backoff_with_jitter(attempt: u32, config: &RetryConfig) -> Duration {
    let base_delay = config.base_delay_ms * 2u64.pow(attempt);
    let jitter_range = (base_delay as f64 * config.jitter_factor) as u64;
    let jitter = rand::rng().random_range(0..=jitter_range * 2) as i64 - jitter_range as i64;
    let delay_ms = (base_delay as i64 + jitter).max(0) as u64;
    Duration::from_millis(delay_ms)
}
