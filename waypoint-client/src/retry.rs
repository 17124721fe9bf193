//! Retrying idempotent requests after transport failures.

use http::Method;
use tokio_util::sync::CancellationToken;
use waypoint_core::{ClientError, Request, Response};

use crate::client::{BoxFuture, cancellable};
use crate::config::RetryPolicy;
use crate::interceptor::{Interceptor, Next};

/// An application interceptor that re-sends a request after a retryable
/// failure, sleeping between attempts according to a [`RetryPolicy`].
///
/// Only idempotent methods are retried; everything else is sent once.
/// Cancellation interrupts both the in-flight attempt and the backoff sleep.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use waypoint_client::{ClientBuilder, RetryInterceptor, RetryPolicy};
///
/// let retry = RetryInterceptor::new(RetryPolicy::aggressive())?;
/// let client = ClientBuilder::new(transport)
///     .with_interceptor(retry)
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct RetryInterceptor {
    policy: RetryPolicy,
}

impl RetryInterceptor {
    /// Create a retry interceptor, validating the policy.
    pub fn new(policy: RetryPolicy) -> Result<Self, ClientError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// Get the policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn run(
        &self,
        request: Request,
        cancel: CancellationToken,
        next: Next,
    ) -> Result<Response, ClientError> {
        if !is_idempotent(request.method()) {
            return next.send(request, cancel).await;
        }

        let mut backoff = self.policy.backoff();
        loop {
            match next.send(request.clone(), cancel.clone()).await {
                Err(e) if e.is_retryable() && backoff.can_retry() => {
                    let delay = backoff.next_delay();
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        error = %e,
                        attempt = backoff.attempts(),
                        delay_ms = delay.as_millis(),
                        uri = %request.uri(),
                        "retrying after transport error"
                    );
                    cancellable(&cancel, async {
                        tokio::time::sleep(delay).await;
                        Ok(())
                    })
                    .await?;
                }
                result => return result,
            }
        }
    }
}

impl Interceptor for RetryInterceptor {
    fn intercept(
        &self,
        request: Request,
        cancel: CancellationToken,
        next: Next,
    ) -> BoxFuture<'_, Result<Response, ClientError>> {
        Box::pin(self.run(request, cancel, next))
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS | Method::TRACE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use http::{HeaderMap, StatusCode};
    use waypoint_core::Body;

    use crate::client::client_fn;

    /// A downstream that fails with a transport error `failures` times.
    fn flaky(failures: u32, calls: Arc<AtomicU32>) -> Next {
        Next::new(Arc::new(client_fn(move |request, _cancel| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if attempt < failures {
                    Err(ClientError::Transport("connection reset".into()))
                } else {
                    Ok(Response::new(StatusCode::OK, HeaderMap::new(), Body::empty(), request))
                }
            })
        })))
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new()
            .max_retries(max_retries)
            .base_delay(Duration::from_millis(1))
            .max_delay(Duration::from_millis(5))
            .jitter(0.0)
    }

    fn get() -> Request {
        Request::parse("http://a.example/").unwrap()
    }

    #[test]
    fn test_new_validates_policy() {
        assert!(RetryInterceptor::new(RetryPolicy::new().jitter(2.0)).is_err());
        assert!(RetryInterceptor::new(RetryPolicy::default()).is_ok());
    }

    #[tokio::test]
    async fn test_eventual_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let retry = RetryInterceptor::new(fast_policy(3)).unwrap();

        let response = retry
            .intercept(get(), CancellationToken::new(), flaky(2, calls.clone()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));
        let retry = RetryInterceptor::new(fast_policy(2)).unwrap();

        let err = retry
            .intercept(get(), CancellationToken::new(), flaky(10, calls.clone()))
            .await
            .unwrap_err();

        assert!(err.is_transport());
        // Initial attempt + 2 retries.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_idempotent_is_sent_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let retry = RetryInterceptor::new(fast_policy(3)).unwrap();

        let err = retry
            .intercept(get().with_method(Method::POST), CancellationToken::new(), flaky(1, calls.clone()))
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_returned() {
        let retry = RetryInterceptor::new(fast_policy(3)).unwrap();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let next = Next::new(Arc::new(client_fn(move |_request, _cancel| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err(ClientError::Body("truncated".into())) })
        })));

        let err = retry.intercept(get(), CancellationToken::new(), next).await.unwrap_err();

        assert!(matches!(err, ClientError::Body(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_backoff() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new()
            .base_delay(Duration::from_secs(60))
            .max_delay(Duration::from_secs(60))
            .jitter(0.0);
        let retry = RetryInterceptor::new(policy).unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let err = retry
            .intercept(get(), cancel, flaky(10, calls.clone()))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
