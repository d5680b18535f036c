//! Retry policy with exponential backoff
//!
//! Wraps API calls so transient failures (throttling, 5xx, timeouts) are
//! retried with exponential backoff and optional jitter.

use log::{debug, warn};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Retry behaviour for API calls
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Errors that can tell whether another attempt might succeed
pub trait RetryableError {
    fn is_retryable(&self) -> bool;
}

impl RetryableError for reqwest::Error {
    fn is_retryable(&self) -> bool {
        if self.is_timeout() || self.is_connect() {
            return true;
        }
        match self.status() {
            Some(status) => status.as_u16() == 429 || status.is_server_error(),
            None => false,
        }
    }
}

/// Executes operations under a [`RetryConfig`]
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Delay before attempt number `attempt` (1-based, the first retry is attempt 2)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(2) as i32;
        let base = self.config.base_delay.as_millis() as f64
            * self.config.backoff_multiplier.powi(exponent);
        let capped = base.min(self.config.max_delay.as_millis() as f64);

        let millis = if self.config.jitter && capped > 0.0 {
            let factor: f64 = rand::rng().random_range(0.5..=1.0);
            capped * factor
        } else {
            capped
        };

        Duration::from_millis(millis as u64)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent
    pub async fn execute<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        E: RetryableError + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if attempt < max_attempts && e.is_retryable() => {
                    attempt += 1;
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} failed ({}), retrying in {:?} (attempt {}/{})",
                        operation, e, delay, attempt, max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct FakeError {
        retryable: bool,
    }

    impl std::fmt::Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fake error (retryable: {})", self.retryable)
        }
    }

    impl RetryableError for FakeError {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_multiplier: 2.0,
            jitter: false,
        })
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<u32, FakeError> = fast_policy(3)
            .execute("describe", || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(FakeError { retryable: true }) } else { Ok(n) }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_on_permanent_failure() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), FakeError> = fast_policy(5)
            .execute("query", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FakeError { retryable: false })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(250),
            backoff_multiplier: 2.0,
            jitter: false,
        });

        assert_eq!(policy.delay_for(2), Duration::from_millis(100));
        assert_eq!(policy.delay_for(3), Duration::from_millis(200));
        assert_eq!(policy.delay_for(4), Duration::from_millis(250));
    }
}
