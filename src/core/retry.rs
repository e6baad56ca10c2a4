//! Bounded retry with exponential backoff
//!
//! Wraps the remote fetch and the store lookups. Only errors reporting
//! [`SyncError::is_retryable`](crate::domain::SyncError::is_retryable) are
//! retried; everything else is returned on the first attempt.

use crate::config::RetryConfig;
use crate::domain::Result;
use std::future::Future;
use std::time::Duration;

/// Retry policy built from a [`RetryConfig`]
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: usize,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.backoff_multiplier.max(1.0),
        }
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay before retry number `attempt` (1-based), capped at the maximum
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as usize) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Runs `operation` until it succeeds, fails permanently, or attempts run out
    pub async fn run<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;
                    if !e.is_retryable() || attempt >= self.max_attempts {
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt);
                    crate::log_retry_attempt!(
                        operation_name,
                        attempt,
                        self.max_attempts,
                        delay.as_millis() as u64,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SourceError, SyncError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy::new(&RetryConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            backoff_multiplier: 2.0,
        })
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy::new(&RetryConfig {
            max_retries: 5,
            initial_delay_ms: 100,
            max_delay_ms: 350,
            backoff_multiplier: 2.0,
        });
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let calls = AtomicUsize::new(0);
        let result = fast_policy(3)
            .run("fetch", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(SourceError::Timeout("slow".to_string()).into())
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = fast_policy(2)
            .run("fetch", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SourceError::ConnectionFailed("down".to_string()).into())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = fast_policy(5)
            .run("fetch", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SyncError::Source(SourceError::AuthenticationFailed(
                    "bad token".to_string(),
                )))
            })
            .await;

        assert!(matches!(
            result,
            Err(SyncError::Source(SourceError::AuthenticationFailed(_)))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
