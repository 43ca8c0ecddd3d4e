//! Retry with exponential backoff for session fetches.

use std::future::Future;
use std::time::Duration;

use super::source::SourceError;

/// Retry limits for a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy with no waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// The delay after the given failed attempt (1-based), doubling each time.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use wage_engine::fetch::RetryPolicy;
    ///
    /// let policy = RetryPolicy {
    ///     max_attempts: 5,
    ///     initial_delay: Duration::from_millis(100),
    ///     max_delay: Duration::from_millis(300),
    /// };
    /// assert_eq!(policy.delay_after(1), Duration::from_millis(100));
    /// assert_eq!(policy.delay_after(2), Duration::from_millis(200));
    /// assert_eq!(policy.delay_after(3), Duration::from_millis(300));
    /// ```
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// The last error after retries ran out, with the attempts made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure {
    /// Attempts made before giving up.
    pub attempts: u32,
    /// The final error.
    pub error: SourceError,
}

/// Runs `operation` until it succeeds, fails permanently, or the attempt
/// limit is reached.
///
/// Transient errors are retried after an exponentially growing delay capped
/// at `max_delay`. Permanent errors are returned after the first attempt.
pub async fn retry_with_backoff<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        "Fetch succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(error) if !error.is_transient() || attempt >= max_attempts => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    error = %error,
                    "Fetch failed, giving up"
                );
                return Err(RetryFailure {
                    attempts: attempt,
                    error,
                });
            }
            Err(error) => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = delay.as_millis() as u64,
                    error = %error,
                    "Transient fetch failure, will retry after backoff"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
