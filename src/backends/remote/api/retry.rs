use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::errors::ProgressApiError;

/// Exponential backoff for transient progress API failures, bounded by a
/// wall-clock budget that also covers attempts still in flight
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Hard limit for the whole call, retries and backoff included
    pub total_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
            total_timeout: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms,
            ..Default::default()
        }
    }

    pub fn with_total_timeout(mut self, total_timeout: Duration) -> Self {
        self.total_timeout = total_timeout;
        self
    }

    /// min(base_delay * 2^attempt, max_delay)
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self
            .base_delay_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }

    /// Backoff before the next attempt; a server-sent `Retry-After` wins but is
    /// capped like any other delay
    fn delay_after(&self, attempt: u32, error: &ProgressApiError) -> Duration {
        match error.retry_after() {
            Some(secs) => Duration::from_secs(secs).min(Duration::from_millis(self.max_delay_ms)),
            None => self.calculate_delay(attempt),
        }
    }

    /// Run `f` until it succeeds, fails permanently, runs out of attempts or
    /// exceeds `total_timeout`. Running out of time is reported as a network
    /// error so callers treat it like an unreachable server.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, f: F) -> Result<T, ProgressApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProgressApiError>>,
    {
        match timeout(self.total_timeout, self.attempt_all(operation_name, f)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "{}: Gave up after {:?}",
                    operation_name, self.total_timeout
                );
                Err(ProgressApiError::Network(format!(
                    "{} timed out after {:?}",
                    operation_name, self.total_timeout
                )))
            }
        }
    }

    async fn attempt_all<F, Fut, T>(&self, operation_name: &str, mut f: F) -> Result<T, ProgressApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProgressApiError>>,
    {
        let mut attempt = 0;
        loop {
            let err = match f().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!("{}: Succeeded on retry {}", operation_name, attempt);
                    }
                    return Ok(result);
                }
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => err,
            };

            if attempt >= self.max_attempts {
                warn!(
                    "{}: Giving up after {} attempts: {}",
                    operation_name,
                    attempt + 1,
                    err
                );
                return Err(err);
            }

            let delay = self.delay_after(attempt, &err);
            debug!(
                "{}: {} (retry {} of {} in {:?})",
                operation_name,
                err,
                attempt + 1,
                self.max_attempts,
                delay
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}
