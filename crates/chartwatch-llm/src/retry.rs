//! Retry logic with exponential backoff and jitter
//!
//! Provider calls hit rate limits under the parallel fan-out; retries back
//! off exponentially with a uniform jitter so concurrent callers do not
//! re-collide on the same schedule.

use crate::error::LLMError;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

type Result<T> = std::result::Result<T, LLMError>;

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,

    /// Initial backoff duration
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,

    /// Backoff multiplier (typically 2.0 for exponential backoff)
    pub backoff_multiplier: f64,

    /// Upper bound of the uniform jitter added to each backoff
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_secs(0),
            max_backoff: Duration::from_secs(0),
            backoff_multiplier: 1.0,
            max_jitter: Duration::from_secs(0),
        }
    }

    /// Create a policy with fast retries (for testing)
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            max_jitter: Duration::from_millis(5),
        }
    }

    /// Calculate backoff duration for a given attempt, without jitter
    fn base_backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_secs(0);
        }

        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);
        let backoff = Duration::from_millis(backoff_ms as u64);

        backoff.min(self.max_backoff)
    }

    /// Backoff with jitter applied
    fn backoff_duration(&self, attempt: u32) -> Duration {
        let base = self.base_backoff(attempt);
        if self.max_jitter.is_zero() {
            return base;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=self.max_jitter.as_millis() as u64);
        base + Duration::from_millis(jitter_ms)
    }

    /// Execute an async operation with retry logic
    ///
    /// Retries only errors classified retryable by [`LLMError::is_retryable`];
    /// everything else is returned to the caller on the first failure.
    ///
    /// # Arguments
    ///
    /// * `operation_name` - Name of the operation (for logging)
    /// * `operation` - Async operation to execute
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            debug!(
                "Attempt {}/{} for operation: {}",
                attempt + 1,
                self.max_attempts,
                operation_name
            );

            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(
                            "Operation '{}' succeeded after {} retries",
                            operation_name, attempt
                        );
                    }
                    return Ok(result);
                }
                Err(e) => {
                    if !e.is_retryable() {
                        debug!(
                            "Operation '{}' failed with non-retryable error",
                            operation_name
                        );
                        return Err(e);
                    }

                    last_error = Some(e);

                    if attempt + 1 < self.max_attempts {
                        let backoff = self.backoff_duration(attempt + 1);
                        warn!(
                            "Operation '{}' failed (attempt {}/{}): {:?}. Retrying in {:?}",
                            operation_name,
                            attempt + 1,
                            self.max_attempts,
                            last_error,
                            backoff
                        );
                        sleep(backoff).await;
                    }
                }
            }
        }

        // All attempts failed
        let error = last_error
            .unwrap_or_else(|| LLMError::RequestFailed("Retry failed with no error".to_string()));

        warn!(
            "Operation '{}' failed after {} attempts: {:?}",
            operation_name, self.max_attempts, error
        );

        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_backoff, Duration::from_secs(1));
        assert_eq!(policy.backoff_multiplier, 2.0);
        assert_eq!(policy.max_jitter, Duration::from_secs(1));
    }

    #[test]
    fn test_base_backoff_progression() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.base_backoff(0), Duration::from_secs(0));
        assert_eq!(policy.base_backoff(1), Duration::from_secs(1));
        assert_eq!(policy.base_backoff(2), Duration::from_secs(2));
        assert_eq!(policy.base_backoff(3), Duration::from_secs(4));
        assert_eq!(policy.base_backoff(4), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_capped_at_max() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            max_jitter: Duration::from_secs(0),
        };

        assert!(policy.backoff_duration(10) <= Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_bounded() {
        let policy = RetryPolicy {
            max_jitter: Duration::from_millis(100),
            ..RetryPolicy::default()
        };
        for _ in 0..20 {
            let with_jitter = policy.backoff_duration(1);
            assert!(with_jitter >= Duration::from_secs(1));
            assert!(with_jitter <= Duration::from_millis(1100));
        }
    }

    #[tokio::test]
    async fn test_execute_success_first_try() {
        let policy = RetryPolicy::fast();
        let attempt_count = Arc::new(Mutex::new(0));
        let count = attempt_count.clone();

        let result = policy
            .execute("test_op", || {
                let count = count.clone();
                async move {
                    *count.lock().await += 1;
                    Ok::<i32, LLMError>(42)
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 42);
        assert_eq!(*attempt_count.lock().await, 1);
    }

    #[tokio::test]
    async fn test_execute_success_after_retry() {
        let policy = RetryPolicy::fast();
        let attempt_count = Arc::new(Mutex::new(0));
        let count = attempt_count.clone();

        let result = policy
            .execute("test_op", || {
                let count = count.clone();
                async move {
                    let mut current = count.lock().await;
                    *current += 1;
                    let val = *current;
                    drop(current);

                    if val < 2 {
                        Err(LLMError::RateLimitExceeded("429".to_string()))
                    } else {
                        Ok::<i32, LLMError>(42)
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 42);
        assert_eq!(*attempt_count.lock().await, 2);
    }

    #[tokio::test]
    async fn test_execute_all_attempts_fail() {
        let policy = RetryPolicy::fast();
        let attempt_count = Arc::new(Mutex::new(0));
        let count = attempt_count.clone();

        let result = policy
            .execute("test_op", || {
                let count = count.clone();
                async move {
                    *count.lock().await += 1;
                    Err::<i32, LLMError>(LLMError::Overloaded("503".to_string()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(*attempt_count.lock().await, 3);
    }

    #[tokio::test]
    async fn test_execute_non_retryable_error() {
        let policy = RetryPolicy::fast();
        let attempt_count = Arc::new(Mutex::new(0));
        let count = attempt_count.clone();

        let result = policy
            .execute("test_op", || {
                let count = count.clone();
                async move {
                    *count.lock().await += 1;
                    Err::<i32, LLMError>(LLMError::AuthenticationFailed)
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(*attempt_count.lock().await, 1); // Should not retry
    }
}
