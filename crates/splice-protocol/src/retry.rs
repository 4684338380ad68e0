//! Retry policy implementation with exponential backoff

use rand::{RngExt, rng};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero disables retrying
    pub max_attempts: u32,

    /// Initial backoff duration
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,

    /// Backoff multiplier
    pub multiplier: f64,

    /// Add jitter to prevent thundering herd
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Create retry policy from environment variables
    ///
    /// Unset or unparsable variables fall back to the defaults, as does a
    /// multiplier below 1.
    pub fn from_env() -> Self {
        fn var<T: std::str::FromStr>(name: &str) -> Option<T> {
            std::env::var(name).ok().and_then(|s| s.parse().ok())
        }

        let defaults = Self::default();
        Self {
            max_attempts: var("SPLICE_MAX_RETRIES").unwrap_or(defaults.max_attempts),
            initial_backoff: var("SPLICE_RETRY_BACKOFF")
                .map_or(defaults.initial_backoff, Duration::from_millis),
            max_backoff: var("SPLICE_MAX_BACKOFF").map_or(defaults.max_backoff, Duration::from_secs),
            multiplier: var::<f64>("SPLICE_BACKOFF_MULTIPLIER")
                .filter(|m| m.is_finite() && *m >= 1.0)
                .unwrap_or(defaults.multiplier),
            jitter: var("SPLICE_RETRY_JITTER").unwrap_or(defaults.jitter),
        }
    }

    /// Same policy with a different retry count
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Execute a function with retry logic
    pub async fn execute<F, Fut, T>(&self, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        let mut backoff = self.initial_backoff;

        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) if !e.should_retry() || attempt >= self.max_attempts => {
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    tracing::warn!("Attempt {} failed: {}", attempt, e);

                    let delay = self.delay(backoff);
                    tokio::time::sleep(delay).await;

                    backoff = self.next_backoff(backoff);
                }
            }
        }
    }

    fn next_backoff(&self, backoff: Duration) -> Duration {
        let next = (backoff.as_secs_f64() * self.multiplier).min(self.max_backoff.as_secs_f64());
        Duration::try_from_secs_f64(next).unwrap_or(self.max_backoff)
    }

    fn delay(&self, backoff: Duration) -> Duration {
        if !self.jitter {
            return backoff;
        }
        let jitter = rng().random_range(0.0..0.3);
        #[allow(clippy::cast_precision_loss)]
        // Precision loss is acceptable for jitter calculation
        let jitter_ms = (backoff.as_millis() as f64 * jitter) as u64;
        backoff + Duration::from_millis(jitter_ms)
    }
}

#[cfg(test)]
#[allow(
    unsafe_code,
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::significant_drop_tightening
)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    const VARS: [&str; 5] = [
        "SPLICE_MAX_RETRIES",
        "SPLICE_RETRY_BACKOFF",
        "SPLICE_MAX_BACKOFF",
        "SPLICE_BACKOFF_MULTIPLIER",
        "SPLICE_RETRY_JITTER",
    ];

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_secs(1),
            multiplier: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff, Duration::from_millis(100));
        assert_eq!(policy.max_backoff, Duration::from_secs(10));
        assert!((policy.multiplier - 2.0).abs() < f64::EPSILON);
        assert!(policy.jitter);
        assert_eq!(RetryPolicy::none().max_attempts, 0);
    }

    // Both env cases run in one test so they cannot race each other
    #[test]
    fn test_from_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
        assert_eq!(RetryPolicy::from_env(), RetryPolicy::default());

        unsafe {
            std::env::set_var("SPLICE_MAX_RETRIES", "5");
            std::env::set_var("SPLICE_RETRY_BACKOFF", "200");
            std::env::set_var("SPLICE_MAX_BACKOFF", "20");
            std::env::set_var("SPLICE_BACKOFF_MULTIPLIER", "1.5");
            std::env::set_var("SPLICE_RETRY_JITTER", "false");
        }

        let policy = RetryPolicy::from_env();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(200));
        assert_eq!(policy.max_backoff, Duration::from_secs(20));
        assert!((policy.multiplier - 1.5).abs() < f64::EPSILON);
        assert!(!policy.jitter);

        for bad in ["-2", "0.5", "NaN", "inf"] {
            unsafe {
                std::env::set_var("SPLICE_BACKOFF_MULTIPLIER", bad);
            }
            let policy = RetryPolicy::from_env();
            assert!((policy.multiplier - 2.0).abs() < f64::EPSILON, "{bad} accepted");
        }

        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_next_backoff_never_panics() {
        let mut policy = fast_policy(1);
        assert_eq!(
            policy.next_backoff(Duration::from_millis(1)),
            Duration::from_millis(2)
        );
        assert_eq!(
            policy.next_backoff(Duration::from_millis(800)),
            Duration::from_secs(1)
        );

        policy.multiplier = -3.0;
        assert_eq!(policy.next_backoff(Duration::from_millis(1)), policy.max_backoff);
        policy.multiplier = f64::NAN;
        assert_eq!(policy.next_backoff(Duration::from_millis(1)), policy.max_backoff);
    }

    #[tokio::test]
    async fn test_execute_retry_on_retryable_error() {
        let policy = fast_policy(3);
        let call_count = Arc::new(Mutex::new(0));
        let call_count_clone = Arc::clone(&call_count);

        let start = Instant::now();
        let result = policy
            .execute(|| async {
                let mut count = call_count_clone.lock().unwrap();
                *count += 1;
                if *count < 3 {
                    Err(ProtocolError::Timeout)
                } else {
                    Ok::<i32, ProtocolError>(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(*call_count.lock().unwrap(), 3);
        // Should have taken at least 1ms + 2ms for backoff
        assert!(start.elapsed() >= Duration::from_millis(2));
    }

    #[tokio::test]
    async fn test_execute_fail_on_non_retryable_error() {
        let policy = fast_policy(3);
        let call_count = Arc::new(Mutex::new(0));
        let call_count_clone = Arc::clone(&call_count);

        let result = policy
            .execute(|| async {
                let mut count = call_count_clone.lock().unwrap();
                *count += 1;
                Err::<i32, ProtocolError>(ProtocolError::NoEndpoints)
            })
            .await;

        assert!(matches!(result, Err(ProtocolError::NoEndpoints)));
        assert_eq!(*call_count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_execute_exceed_max_attempts() {
        let policy = fast_policy(2);
        let call_count = Arc::new(Mutex::new(0));
        let call_count_clone = Arc::clone(&call_count);

        let result = policy
            .execute(|| async {
                let mut count = call_count_clone.lock().unwrap();
                *count += 1;
                Err::<i32, ProtocolError>(ProtocolError::Timeout)
            })
            .await;

        assert!(matches!(result, Err(ProtocolError::Timeout)));
        // Should have called initial + max_attempts times
        assert_eq!(*call_count.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_no_retry_policy() {
        let policy = RetryPolicy::none();
        let call_count = Arc::new(Mutex::new(0));
        let call_count_clone = Arc::clone(&call_count);

        let result = policy
            .execute(|| async {
                *call_count_clone.lock().unwrap() += 1;
                Err::<i32, ProtocolError>(ProtocolError::Timeout)
            })
            .await;

        assert!(result.is_err());
        assert_eq!(*call_count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_backoff_progression() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(50),
            multiplier: 2.0,
            jitter: false,
        };

        let call_count = Arc::new(Mutex::new(0));
        let call_count_clone = Arc::clone(&call_count);
        let start = Instant::now();

        let _result = policy
            .execute(|| async {
                *call_count_clone.lock().unwrap() += 1;
                Err::<i32, ProtocolError>(ProtocolError::Timeout)
            })
            .await;

        // At least 10ms + 20ms + 40ms + 50ms (capped)
        assert!(start.elapsed() >= Duration::from_millis(120));
        assert_eq!(*call_count.lock().unwrap(), 5);
    }
}
