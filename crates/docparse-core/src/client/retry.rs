use crate::client::{CompletionRequest, ModelClient};
use crate::error::ModelClientError;
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Bounds on how a model call is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Applied to every attempt separately.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (1-based): `base * 2^(retry-1)`, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }

    /// Delay before the next attempt, honoring a server-requested delay.
    pub fn delay_for(&self, retry: u32, error: &ModelClientError) -> Duration {
        match error.retry_after() {
            Some(requested) => requested.min(self.max_delay),
            None => self.backoff(retry),
        }
    }
}

/// Wraps a [`ModelClient`] with per-attempt timeouts and exponential backoff.
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        RetryingClient { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C> ModelClient for RetryingClient<C>
where
    C: ModelClient,
{
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelClientError> {
        let attempts = self.policy.max_retries + 1;
        let mut attempt = 1;

        loop {
            tracing::debug!(
                backend = self.inner.backend_name(),
                model = %request.model,
                expected_fields = request.expected_fields.len(),
                images = request.images.len(),
                "model call attempt {}/{}",
                attempt,
                attempts
            );
            let start = Instant::now();

            let error = match tokio::time::timeout(
                self.policy.attempt_timeout,
                self.inner.complete(request),
            )
            .await
            {
                Ok(Ok(reply)) => {
                    tracing::debug!(elapsed = ?start.elapsed(), "model call succeeded");
                    return Ok(reply);
                }
                Ok(Err(error)) => error,
                Err(_) => ModelClientError::Timeout(self.policy.attempt_timeout),
            };

            if !error.is_retryable() {
                tracing::warn!(error = %error, "model call failed, not retryable");
                return Err(error);
            }
            if attempt >= attempts {
                tracing::warn!(error = %error, "model call failed after {} attempts", attempts);
                return Err(error);
            }

            let delay = self.policy.delay_for(attempt, &error);
            tracing::warn!(
                error = %error,
                "model call attempt {} failed, retrying in {:?}",
                attempt,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn backend_name(&self) -> &str {
        self.inner.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed sequence of outcomes and counts calls.
    struct Scripted {
        outcomes: Mutex<VecDeque<Result<String, ModelClientError>>>,
        calls: Mutex<u32>,
        hang: bool,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<String, ModelClientError>>) -> Self {
            Scripted {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(0),
                hang: false,
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ModelClient for Scripted {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, ModelClientError> {
            *self.calls.lock().unwrap() += 1;
            if self.hang {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ModelClientError::Transport("script exhausted".into())))
        }

        fn backend_name(&self) -> &str {
            "scripted"
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            attempt_timeout: Duration::from_secs(5),
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "test-model".into(),
            system: "sys".into(),
            user: "user".into(),
            images: vec![],
            expected_fields: vec![],
            max_tokens: 100,
            temperature: 0.0,
        }
    }

    fn server_error() -> ModelClientError {
        ModelClientError::Server {
            status: 503,
            message: "overloaded".into(),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            attempt_timeout: Duration::from_secs(60),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_secs(1));
        assert_eq!(policy.backoff(3), Duration::from_secs(2));
        assert_eq!(policy.backoff(6), Duration::from_secs(8));
        assert_eq!(policy.backoff(40), Duration::from_secs(8));
    }

    #[test]
    fn test_retry_after_overrides_backoff() {
        let policy = RetryPolicy::default();
        let limited = ModelClientError::RateLimited {
            retry_after: Some(Duration::from_secs(3)),
            message: String::new(),
        };
        assert_eq!(policy.delay_for(1, &limited), Duration::from_secs(3));

        let excessive = ModelClientError::RateLimited {
            retry_after: Some(Duration::from_secs(600)),
            message: String::new(),
        };
        assert_eq!(policy.delay_for(1, &excessive), policy.max_delay);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let client = RetryingClient::new(
            Scripted::new(vec![
                Err(server_error()),
                Err(ModelClientError::RateLimited {
                    retry_after: None,
                    message: "slow down".into(),
                }),
                Ok("{}".into()),
            ]),
            fast_policy(3),
        );
        assert_eq!(client.complete(&request()).await.unwrap(), "{}");
        assert_eq!(client.inner().calls(), 3);
    }

    #[tokio::test]
    async fn test_auth_failure_not_retried() {
        let client = RetryingClient::new(
            Scripted::new(vec![
                Err(ModelClientError::Auth {
                    status: 401,
                    message: "bad key".into(),
                }),
                Ok("{}".into()),
            ]),
            fast_policy(3),
        );
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, ModelClientError::Auth { .. }));
        assert_eq!(client.inner().calls(), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let client = RetryingClient::new(
            Scripted::new(vec![
                Err(server_error()),
                Err(server_error()),
                Err(server_error()),
                Ok("{}".into()),
            ]),
            fast_policy(2),
        );
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, ModelClientError::Server { status: 503, .. }));
        assert_eq!(client.inner().calls(), 3);
    }

    #[tokio::test]
    async fn test_attempt_timeout() {
        let mut scripted = Scripted::new(vec![]);
        scripted.hang = true;
        let policy = RetryPolicy {
            attempt_timeout: Duration::from_millis(20),
            ..fast_policy(1)
        };
        let client = RetryingClient::new(scripted, policy);
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, ModelClientError::Timeout(_)));
        assert_eq!(client.inner().calls(), 2);
    }
}
