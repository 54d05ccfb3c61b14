//! Fixed-delay retry engine with key rotation
//!
//! Every failure class shares one attempt budget per logical request. A
//! rate-limit response advances the key cursor before the delay; all other
//! transient classes retry with the same key. Non-transient errors
//! propagate immediately.

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use super::client::ClientError;
use super::keys::KeyRing;

/// Failure classes eligible for automatic retry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    RateLimited,
    ServiceUnavailable,
    ServerError,
    Timeout,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureClass::RateLimited => write!(f, "rate_limited"),
            FailureClass::ServiceUnavailable => write!(f, "service_unavailable"),
            FailureClass::ServerError => write!(f, "server_error"),
            FailureClass::Timeout => write!(f, "timeout"),
        }
    }
}

/// Fixed delays per failure class plus the shared attempt budget.
/// Read-only for the process lifetime.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Shared attempt budget across all failure classes
    pub max_attempts: u32,
    /// Delay after a rate-limit response (retries with the next key)
    pub rate_limited: Duration,
    /// Delay after a 503 (retries with the same key)
    pub service_unavailable: Duration,
    /// Delay after any other 5xx (retries with the same key)
    pub server_error: Duration,
    /// Delay after a request timeout (treated like a server error)
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limited: Duration::from_millis(2000),
            service_unavailable: Duration::from_millis(3000),
            server_error: Duration::from_millis(2000),
            timeout: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, class: FailureClass) -> Duration {
        match class {
            FailureClass::RateLimited => self.rate_limited,
            FailureClass::ServiceUnavailable => self.service_unavailable,
            FailureClass::ServerError => self.server_error,
            FailureClass::Timeout => self.timeout,
        }
    }
}

/// Run one logical request with rotation and retries.
///
/// The operation is invoked with the currently active API key; a fresh key
/// is fetched for every attempt so that a rotation performed by a
/// rate-limit response (here or in a concurrent request) takes effect on
/// the next attempt.
pub async fn run<T, F, Fut>(
    keys: &KeyRing,
    policy: &RetryPolicy,
    operation: &'static str,
    mut op: F,
) -> Result<T, ClientError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let key = keys.current().to_string();

        match op(key).await {
            Ok(value) => {
                if attempts > 1 {
                    tracing::info!(operation, attempts, "Request succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                let Some(class) = err.failure_class() else {
                    // Not transient: no local recovery, propagate as-is
                    return Err(err);
                };

                if attempts >= policy.max_attempts {
                    tracing::error!(
                        operation,
                        attempts,
                        class = %class,
                        error = %err,
                        "Retry budget exhausted"
                    );
                    return Err(ClientError::RetryBudgetExhausted { class, attempts });
                }

                if class == FailureClass::RateLimited {
                    let index = keys.advance();
                    tracing::warn!(
                        operation,
                        key_index = index + 1,
                        key_count = keys.len(),
                        "Rate limited, switched API key"
                    );
                }

                let delay = policy.delay_for(class);
                tracing::warn!(
                    operation,
                    attempt = attempts,
                    class = %class,
                    delay_ms = delay.as_millis() as u64,
                    "Transient failure, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            rate_limited: Duration::from_millis(1),
            service_unavailable: Duration::from_millis(1),
            server_error: Duration::from_millis(1),
            timeout: Duration::from_millis(1),
        }
    }

    fn rate_limited() -> ClientError {
        ClientError::Api {
            code: 429,
            message: "too many requests".to_string(),
        }
    }

    fn unavailable() -> ClientError {
        ClientError::Api {
            code: 503,
            message: "service unavailable".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_first_attempt_leaves_cursor_unchanged() {
        let keys = KeyRing::new(vec!["k1".to_string(), "k2".to_string()]).unwrap();
        let policy = fast_policy(3);

        let result = run(&keys, &policy, "test", |key| async move {
            Ok::<_, ClientError>(key)
        })
        .await
        .unwrap();

        assert_eq!(result, "k1");
        assert_eq!(keys.current_index(), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_rotates_to_next_key() {
        let keys = KeyRing::new(vec!["k1".to_string(), "k2".to_string()]).unwrap();
        let policy = fast_policy(3);

        let result = run(&keys, &policy, "test", |key| async move {
            if key == "k1" {
                Err(rate_limited())
            } else {
                Ok(key)
            }
        })
        .await
        .unwrap();

        // K1 rate-limited, K2 succeeded; cursor now points at K2
        assert_eq!(result, "k2");
        assert_eq!(keys.current_index(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_wraps_around_pool() {
        let keys = KeyRing::new(vec!["k1".to_string(), "k2".to_string()]).unwrap();
        let policy = fast_policy(4);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = run(&keys, &policy, "test", move |key| {
            let calls = calls_clone.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                // Rate-limit twice so rotation passes k2 and wraps to k1
                if n < 2 {
                    Err(rate_limited())
                } else {
                    Ok(key)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "k1");
        assert_eq!(keys.current_index(), 0);
    }

    #[tokio::test]
    async fn test_transient_error_retries_same_key() {
        let keys = KeyRing::new(vec!["k1".to_string(), "k2".to_string()]).unwrap();
        let policy = fast_policy(3);
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let result = run(&keys, &policy, "test", move |key| {
            let seen = seen_clone.clone();
            async move {
                let mut guard = seen.lock().unwrap();
                guard.push(key.clone());
                if guard.len() < 2 {
                    Err(unavailable())
                } else {
                    Ok(key)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "k1");
        assert_eq!(*seen.lock().unwrap(), vec!["k1".to_string(), "k1".to_string()]);
        assert_eq!(keys.current_index(), 0);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_counts_exact_attempts() {
        let keys = KeyRing::new(vec!["k1".to_string()]).unwrap();
        let policy = fast_policy(3);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<(), _> = run(&keys, &policy, "test", move |_key| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(unavailable())
            }
        })
        .await;

        // Exactly the budget's worth of attempts, then terminal failure
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(ClientError::RetryBudgetExhausted { class, attempts }) => {
                assert_eq!(class, FailureClass::ServiceUnavailable);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected RetryBudgetExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mixed_classes_share_one_budget() {
        let keys = KeyRing::new(vec!["k1".to_string(), "k2".to_string()]).unwrap();
        let policy = fast_policy(3);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<(), _> = run(&keys, &policy, "test", move |_key| {
            let calls = calls_clone.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(rate_limited())
                } else {
                    Err(ClientError::Api {
                        code: 500,
                        message: "internal".to_string(),
                    })
                }
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(ClientError::RetryBudgetExhausted { class, attempts }) => {
                // The last observed class is reported
                assert_eq!(class, FailureClass::ServerError);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected RetryBudgetExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_transient_error_propagates_immediately() {
        let keys = KeyRing::new(vec!["k1".to_string()]).unwrap();
        let policy = fast_policy(3);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<(), _> = run(&keys, &policy, "test", move |_key| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::Api {
                    code: 400,
                    message: "bad request".to_string(),
                })
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ClientError::Api { code: 400, .. })));
    }
}
