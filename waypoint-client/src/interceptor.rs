//! Interceptors for the waypoint HTTP client.
//!
//! Interceptors allow you to add cross-cutting logic to requests, such as:
//! - Adding authentication headers
//! - Logging and metrics
//! - Retry logic
//! - Following redirects
//!
//! An interceptor receives the request, the caller's cancellation token and
//! a [`Next`] handle to the rest of the chain. It may call `next` zero, one
//! or many times, rewriting the request in between.
//!
//! # Example
//!
//! ```ignore
//! use waypoint_client::{ClientBuilder, HeaderInterceptor, FnInterceptor};
//!
//! let auth = HeaderInterceptor::new("authorization", "Bearer token123");
//! let logging = FnInterceptor::new(|request, cancel, next| {
//!     Box::pin(async move {
//!         println!("GET {}", request.uri());
//!         next.send(request, cancel).await
//!     })
//! });
//!
//! let client = ClientBuilder::new(transport)
//!     .with_interceptor(auth)
//!     .with_interceptor(logging)
//!     .build();
//! ```

use std::fmt;
use std::sync::Arc;

use http::{HeaderName, HeaderValue};
use tokio_util::sync::CancellationToken;
use waypoint_core::{ClientError, Request, Response};

use crate::client::{BoxFuture, Client};

/// Wrap a downstream [`Client`] with extra behavior.
///
/// The same trait is used for application interceptors (which see every
/// request a caller makes, once) and network interceptors (which see every
/// exchange the transport performs, including each redirect leg).
pub trait Interceptor: Send + Sync {
    /// Handle `request`, delegating to `next` as needed.
    fn intercept(
        &self,
        request: Request,
        cancel: CancellationToken,
        next: Next,
    ) -> BoxFuture<'_, Result<Response, ClientError>>;
}

impl<I: Interceptor + ?Sized> Interceptor for Arc<I> {
    fn intercept(
        &self,
        request: Request,
        cancel: CancellationToken,
        next: Next,
    ) -> BoxFuture<'_, Result<Response, ClientError>> {
        (**self).intercept(request, cancel, next)
    }
}

/// The "next" step in the interceptor chain.
///
/// Call [`Next::send`] to proceed to the next interceptor or the transport.
/// Cloning is cheap, and a handle may be used for any number of calls.
#[derive(Clone)]
pub struct Next {
    inner: Arc<dyn Client>,
}

impl Next {
    /// Wrap a client as the downstream of an interceptor.
    pub fn new(inner: Arc<dyn Client>) -> Self {
        Self { inner }
    }

    /// Send a request to the rest of the chain.
    pub async fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> Result<Response, ClientError> {
        self.inner.send(request, cancel).await
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// An interceptor bound to its downstream client.
///
/// This is one layer of an assembled pipeline.
pub(crate) struct Intercepted {
    interceptor: Arc<dyn Interceptor>,
    next: Next,
}

impl Intercepted {
    pub(crate) fn new(interceptor: Arc<dyn Interceptor>, next: Arc<dyn Client>) -> Self {
        Self {
            interceptor,
            next: Next::new(next),
        }
    }
}

impl Client for Intercepted {
    fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<Response, ClientError>> {
        self.interceptor.intercept(request, cancel, self.next.clone())
    }
}

/// A simple interceptor that sets a header on every request.
///
/// # Example
///
/// ```ignore
/// use waypoint_client::HeaderInterceptor;
///
/// let auth = HeaderInterceptor::new("authorization", "Bearer token123");
/// let client = ClientBuilder::new(transport)
///     .with_interceptor(auth)
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct HeaderInterceptor {
    name: HeaderName,
    value: HeaderValue,
}

impl HeaderInterceptor {
    /// Create a new header interceptor.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value is invalid.
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.parse().expect("invalid header name"),
            value: value.parse().expect("invalid header value"),
        }
    }

    /// Try to create a new header interceptor, returning an error if invalid.
    pub fn try_new(name: &str, value: &str) -> Result<Self, ClientError> {
        let name = name
            .parse()
            .map_err(|_| ClientError::InvalidConfig(format!("invalid header name: {name}")))?;
        let value = value
            .parse()
            .map_err(|_| ClientError::InvalidConfig(format!("invalid header value: {value}")))?;
        Ok(Self { name, value })
    }

    /// Create a new header interceptor from pre-parsed values.
    pub fn from_parts(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }
}

impl Interceptor for HeaderInterceptor {
    fn intercept(
        &self,
        request: Request,
        cancel: CancellationToken,
        next: Next,
    ) -> BoxFuture<'_, Result<Response, ClientError>> {
        let request = request.with_header(self.name.clone(), self.value.clone());
        Box::pin(async move { next.send(request, cancel).await })
    }
}

/// A closure-based interceptor.
///
/// # Example
///
/// ```
/// use waypoint_client::FnInterceptor;
///
/// let logging = FnInterceptor::new(|request, cancel, next| {
///     Box::pin(async move {
///         println!("sending {} {}", request.method(), request.uri());
///         let result = next.send(request, cancel).await;
///         println!("done");
///         result
///     })
/// });
/// ```
#[derive(Clone)]
pub struct FnInterceptor<F> {
    func: F,
}

impl<F> FnInterceptor<F>
where
    F: Fn(Request, CancellationToken, Next) -> BoxFuture<'static, Result<Response, ClientError>>
        + Send
        + Sync,
{
    /// Create a new closure-based interceptor.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(Request, CancellationToken, Next) -> BoxFuture<'static, Result<Response, ClientError>>
        + Send
        + Sync,
{
    fn intercept(
        &self,
        request: Request,
        cancel: CancellationToken,
        next: Next,
    ) -> BoxFuture<'_, Result<Response, ClientError>> {
        (self.func)(request, cancel, next)
    }
}

impl<F> fmt::Debug for FnInterceptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use http::{HeaderMap, StatusCode};
    use waypoint_core::Body;

    use crate::client::client_fn;

    /// A transport that records the headers of every request it sees.
    fn recording_transport(seen: Arc<Mutex<Vec<HeaderMap>>>) -> Arc<dyn Client> {
        Arc::new(client_fn(move |request, _cancel| {
            seen.lock().unwrap().push(request.headers().clone());
            Box::pin(async move {
                Ok(Response::new(StatusCode::OK, HeaderMap::new(), Body::empty(), request))
            })
        }))
    }

    fn request() -> Request {
        Request::parse("http://a.example/").unwrap()
    }

    #[tokio::test]
    async fn test_header_interceptor() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let layer = Intercepted::new(
            Arc::new(HeaderInterceptor::new("x-auth", "bearer-token")),
            recording_transport(seen.clone()),
        );

        layer.send(request(), CancellationToken::new()).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].get("x-auth").unwrap(), "bearer-token");
    }

    #[test]
    fn test_header_interceptor_try_new_rejects_invalid() {
        assert!(HeaderInterceptor::try_new("bad header", "v").is_err());
        assert!(HeaderInterceptor::try_new("x-ok", "line\nbreak").is_err());
        assert!(HeaderInterceptor::try_new("x-ok", "fine").is_ok());
    }

    #[tokio::test]
    async fn test_fn_interceptor_can_call_next_repeatedly() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let twice = FnInterceptor::new(|request, cancel, next| {
            Box::pin(async move {
                next.send(request.clone(), cancel.clone()).await?;
                next.send(request, cancel).await
            })
        });
        let layer = Intercepted::new(Arc::new(twice), recording_transport(seen.clone()));

        layer.send(request(), CancellationToken::new()).await.unwrap();

        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fn_interceptor_can_short_circuit() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let deny = FnInterceptor::new(|_request, _cancel, _next| {
            Box::pin(async { Err(ClientError::InvalidConfig("blocked".into())) })
        });
        let layer = Intercepted::new(Arc::new(deny), recording_transport(seen.clone()));

        let err = layer.send(request(), CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, ClientError::InvalidConfig(_)));
        assert!(seen.lock().unwrap().is_empty());
    }
}
