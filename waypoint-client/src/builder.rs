//! Pipeline assembly.
//!
//! [`ClientBuilder`] turns a base transport plus two ordered lists of
//! interceptors into a single [`Pipeline`]:
//!
//! ```text
//! caller
//!   -> application[0] -> application[1] -> ... -> application[n-1]
//!   -> network[m-1] -> ... -> network[0]
//!   -> transport
//! ```
//!
//! Application interceptors run in registration order: the first one
//! registered is the first to see a request and the last to see its
//! response. Network interceptors wrap the transport in registration order,
//! so the first one registered sits directly on top of it.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use waypoint_core::{ClientError, Request, Response};

use crate::client::{BoxFuture, Client};
use crate::config::RedirectPolicy;
use crate::interceptor::{Intercepted, Interceptor};
use crate::redirect::RedirectInterceptor;

/// Builder for creating a [`Pipeline`].
///
/// # Example
///
/// ```ignore
/// use waypoint_client::{ClientBuilder, HeaderInterceptor, HyperTransport, RedirectPolicy};
///
/// let client = ClientBuilder::new(HyperTransport::new()?)
///     .with_interceptor(HeaderInterceptor::new("authorization", "Bearer token"))
///     .follow_redirects(RedirectPolicy::new().max_redirects(5))?
///     .build();
/// ```
pub struct ClientBuilder {
    transport: Arc<dyn Client>,
    network: Vec<Arc<dyn Interceptor>>,
    application: Vec<Arc<dyn Interceptor>>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("network_interceptors", &self.network.len())
            .field("application_interceptors", &self.application.len())
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    /// Start a builder over `transport`.
    pub fn new(transport: impl Client + 'static) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Start a builder over an already shared transport.
    pub fn from_shared(transport: Arc<dyn Client>) -> Self {
        Self {
            transport,
            network: Vec::new(),
            application: Vec::new(),
        }
    }

    /// Register an application interceptor.
    ///
    /// Application interceptors see each caller request once, in
    /// registration order.
    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.application.push(Arc::new(interceptor));
        self
    }

    /// Register a network interceptor.
    ///
    /// Network interceptors sit below every application interceptor and see
    /// each individual exchange with the transport.
    pub fn with_network_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.network.push(Arc::new(interceptor));
        self
    }

    /// Register a [`RedirectInterceptor`] as the next application interceptor.
    pub fn follow_redirects(self, policy: RedirectPolicy) -> Result<Self, ClientError> {
        Ok(self.with_interceptor(RedirectInterceptor::new(policy)?))
    }

    /// Assemble the pipeline.
    pub fn build(self) -> Pipeline {
        let interceptor_count = self.network.len() + self.application.len();

        let mut client = self.transport;
        for interceptor in self.network {
            client = Arc::new(Intercepted::new(interceptor, client));
        }
        // Wrap innermost first so the first registered ends up outermost.
        for interceptor in self.application.into_iter().rev() {
            client = Arc::new(Intercepted::new(interceptor, client));
        }

        Pipeline {
            inner: client,
            interceptor_count,
        }
    }
}

/// An assembled client: transport plus interceptors.
///
/// Cloning is cheap; clones share the same layers. A pipeline holds no
/// per-call state, so any number of calls may run concurrently.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<dyn Client>,
    interceptor_count: usize,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("interceptor_count", &self.interceptor_count)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Start a builder over `transport`.
    pub fn builder(transport: impl Client + 'static) -> ClientBuilder {
        ClientBuilder::new(transport)
    }

    /// Total number of interceptors in the pipeline.
    pub fn interceptor_count(&self) -> usize {
        self.interceptor_count
    }

    /// Send a request that is never cancelled.
    pub async fn execute(&self, request: Request) -> Result<Response, ClientError> {
        self.inner.send(request, CancellationToken::new()).await
    }
}

impl Client for Pipeline {
    fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<Response, ClientError>> {
        self.inner.send(request, cancel)
    }
}
