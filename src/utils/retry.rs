//! Retry utilities with exponential backoff for resilient fetches.

use std::time::Duration;
use tokio::time::sleep;

use crate::config::HttpConfig;
use crate::fetch::FetchError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts (first try included)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Retry policy derived from the `[http]` section
    pub fn from_http(http: &HttpConfig) -> Self {
        Self {
            max_attempts: http.retry_count.max(1),
            initial_delay: http.request_delay(),
            ..Self::default()
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powf(attempt.saturating_sub(1) as f64);
        Duration::from_secs_f64(exp.min(self.max_delay.as_secs_f64()))
    }
}

/// Execute an async operation, retrying transient [`FetchError`]s.
///
/// Permanent errors are returned immediately; transient ones are retried
/// until `max_attempts` is reached.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, operation: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, FetchError>>,
{
    let mut attempts = 0;
    let mut operation = operation;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    tracing::info!(
                        "Request succeeded on attempt {} after {} transient failures",
                        attempts,
                        attempts - 1
                    );
                }
                return Ok(result);
            }
            Err(error) if error.is_transient() && attempts < config.max_attempts => {
                let delay = config.delay_for(attempts);
                tracing::warn!(
                    "Request failed (attempt {}/{}): {}, retrying in {:?}",
                    attempts,
                    config.max_attempts,
                    error,
                    delay
                );
                sleep(delay).await;
            }
            Err(error) => {
                if error.is_transient() {
                    tracing::warn!("Request failed after {} attempts: {}", attempts, error);
                }
                return Err(error);
            }
        }
    }
}
