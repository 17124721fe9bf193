//! The `Client` capability.
//!
//! Every layer of the pipeline, from the raw transport to the outermost
//! interceptor, is a [`Client`]: something that turns a [`Request`] into a
//! [`Response`] and can be cancelled through a [`CancellationToken`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use waypoint_core::{ClientError, Request, Response};

/// Type alias for a boxed future returning a result.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Send a request, receive a response.
///
/// Implementations must honor `cancel`: once it fires, the in-flight call
/// should stop and resolve to [`ClientError::Cancelled`].
pub trait Client: Send + Sync {
    /// Send `request` and wait for the response head.
    fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<Response, ClientError>>;
}

impl<C: Client + ?Sized> Client for Arc<C> {
    fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<Response, ClientError>> {
        (**self).send(request, cancel)
    }
}

impl<C: Client + ?Sized> Client for Box<C> {
    fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<Response, ClientError>> {
        (**self).send(request, cancel)
    }
}

/// A [`Client`] backed by a closure.
///
/// Handy for stub transports in tests and for adapting other HTTP stacks.
///
/// # Example
///
/// ```
/// use http::{HeaderMap, StatusCode};
/// use waypoint_client::client_fn;
/// use waypoint_core::{Body, Response};
///
/// let transport = client_fn(|request, _cancel| {
///     Box::pin(async move {
///         Ok(Response::new(StatusCode::OK, HeaderMap::new(), Body::empty(), request))
///     })
/// });
/// ```
#[derive(Clone)]
pub struct ClientFn<F> {
    func: F,
}

/// Create a [`Client`] from a closure.
pub fn client_fn<F>(func: F) -> ClientFn<F>
where
    F: Fn(Request, CancellationToken) -> BoxFuture<'static, Result<Response, ClientError>>
        + Send
        + Sync,
{
    ClientFn { func }
}

impl<F> Client for ClientFn<F>
where
    F: Fn(Request, CancellationToken) -> BoxFuture<'static, Result<Response, ClientError>>
        + Send
        + Sync,
{
    fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<Response, ClientError>> {
        (self.func)(request, cancel)
    }
}

impl<F> fmt::Debug for ClientFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientFn").finish()
    }
}

/// Race `fut` against `cancel`, reporting [`ClientError::Cancelled`] if the
/// token fires first.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        result = fut => result,
    }
}
