/*!
 * Bounded retry for translation calls.
 *
 * Every failed attempt is retried after a fixed delay until the attempt
 * budget is spent. The last error is then wrapped in
 * `TranslationError::RetriesExhausted`.
 */

use log::warn;
use std::future::Future;
use std::time::Duration;

use crate::errors::TranslationError;

/// Retry budget and fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Pause after each failed attempt
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Policy that tries once and never waits
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Whether a failed attempt should be tried again
    pub fn is_retryable(error: &TranslationError) -> bool {
        !matches!(error, TranslationError::RetriesExhausted { .. })
    }

    /// Run `operation` until it succeeds or the budget is spent
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, TranslationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TranslationError>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < attempts && Self::is_retryable(&error) => {
                    warn!(
                        "Translation attempt {}/{} failed: {} - retrying in {:.1}s",
                        attempt,
                        attempts,
                        error,
                        self.delay.as_secs_f32()
                    );
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
                Err(error) => {
                    return Err(TranslationError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(error),
                    });
                }
            }
        }
    }
}
