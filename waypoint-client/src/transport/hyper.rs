//! Hyper-based HTTP transport.
//!
//! This module provides [`HyperTransport`], the base [`Client`] of a
//! pipeline, built on hyper_util's legacy client.

use std::time::Duration;

use hyper::body::Incoming;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{self, connect::HttpConnector};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use rustls::ClientConfig;
use tokio_util::sync::CancellationToken;
use waypoint_core::{Body, ClientError, Request, Response};

use super::connector::{build_https_connector, default_tls_config};
use crate::client::{BoxFuture, Client, cancellable};

#[cfg(feature = "tracing")]
use tracing::Instrument;

/// Type alias for the hyper client with HTTPS connector.
type HyperClient = legacy::Client<HttpsConnector<HttpConnector>, Body>;

/// HTTP transport using hyper_util's legacy client.
///
/// Speaks HTTP/1.1 and HTTP/2 (negotiated over ALPN for `https` URIs), pools
/// connections, and never follows redirects itself: every exchange is
/// returned as-is so the interceptors above it can decide what to do.
///
/// # Example
///
/// ```ignore
/// use waypoint_client::{ClientBuilder, HyperTransport, RedirectPolicy};
///
/// let client = ClientBuilder::new(HyperTransport::new()?)
///     .follow_redirects(RedirectPolicy::default())?
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient,
    http2_only: bool,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("http2_only", &self.http2_only)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a new transport builder.
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::new()
    }

    /// Create a new transport with default settings.
    pub fn new() -> Result<Self, ClientError> {
        Self::builder().build()
    }

    /// Check if this transport is configured for HTTP/2 only.
    pub fn is_http2_only(&self) -> bool {
        self.http2_only
    }

    async fn exchange(
        client: HyperClient,
        request: Request,
        cancel: CancellationToken,
    ) -> Result<Response, ClientError> {
        let http_request = request.to_http()?;

        let response: http::Response<Incoming> = cancellable(&cancel, async {
            client
                .request(http_request)
                .await
                .map_err(|e| ClientError::Transport(format!("request failed: {e}")))
        })
        .await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(status = response.status().as_u16(), "response head received");

        Ok(Response::from_http(response.map(Body::from_http_body), request))
    }
}

impl Client for HyperTransport {
    fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<Response, ClientError>> {
        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!(
            "http_exchange",
            method = %request.method(),
            uri = %request.uri(),
        );

        let fut = Self::exchange(self.client.clone(), request, cancel);

        #[cfg(feature = "tracing")]
        let fut = fut.instrument(span);

        Box::pin(fut)
    }
}

/// Builder for [`HyperTransport`].
///
/// # Example
///
/// ```ignore
/// use waypoint_client::HyperTransportBuilder;
/// use std::time::Duration;
///
/// let transport = HyperTransportBuilder::new()
///     .http2_only(true)
///     .pool_idle_timeout(Duration::from_secs(90))
///     .build()?;
/// ```
pub struct HyperTransportBuilder {
    /// Custom TLS configuration.
    tls_config: Option<ClientConfig>,
    /// Force HTTP/2 only (prior knowledge, no upgrade).
    http2_only: bool,
    /// Connection pool idle timeout.
    pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host.
    pool_max_idle_per_host: usize,
}

impl Default for HyperTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransportBuilder {
    /// Create a new transport builder with default settings.
    pub fn new() -> Self {
        Self {
            tls_config: None,
            http2_only: false,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
        }
    }

    /// Set a custom TLS configuration.
    ///
    /// Without one, [`build`](Self::build) uses the configuration selected by
    /// the `tls-*` features.
    pub fn tls_config(mut self, config: ClientConfig) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Enable HTTP/2 only mode.
    ///
    /// Plain `http` URIs then use h2c with prior knowledge.
    pub fn http2_only(mut self, enabled: bool) -> Self {
        self.http2_only = enabled;
        self
    }

    /// Set the connection pool idle timeout.
    ///
    /// Default: 90 seconds.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Keep idle connections open indefinitely.
    pub fn pool_idle_timeout_none(mut self) -> Self {
        self.pool_idle_timeout = None;
        self
    }

    /// Set the maximum number of idle connections per host.
    ///
    /// Default: 32.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Build the transport.
    ///
    /// Fails with [`ClientError::InvalidConfig`] when no TLS configuration
    /// was given and the enabled features cannot produce one.
    pub fn build(self) -> Result<HyperTransport, ClientError> {
        let tls_config = match self.tls_config {
            Some(config) => config,
            None => default_tls_config()?,
        };
        let connector = build_https_connector(tls_config);

        let mut builder = legacy::Client::builder(TokioExecutor::new());
        // Required for pool_idle_timeout to take effect.
        builder.pool_timer(TokioTimer::new());
        if let Some(timeout) = self.pool_idle_timeout {
            builder.pool_idle_timeout(timeout);
        }
        builder.pool_max_idle_per_host(self.pool_max_idle_per_host);
        if self.http2_only {
            builder.http2_only(true);
        }

        Ok(HyperTransport {
            client: builder.build(connector),
            http2_only: self.http2_only,
        })
    }
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("tls_config", &self.tls_config.is_some())
            .field("http2_only", &self.http2_only)
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = HyperTransportBuilder::new();
        assert!(!builder.http2_only);
        assert_eq!(builder.pool_max_idle_per_host, 32);
        assert_eq!(builder.pool_idle_timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_builder_pool_settings() {
        let builder = HyperTransportBuilder::new()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(10);
        assert_eq!(builder.pool_idle_timeout, Some(Duration::from_secs(60)));
        assert_eq!(builder.pool_max_idle_per_host, 10);

        let builder = builder.pool_idle_timeout_none();
        assert_eq!(builder.pool_idle_timeout, None);
    }

    #[cfg(feature = "tls")]
    #[tokio::test]
    async fn test_build_transport_http2_only() {
        let transport = HyperTransportBuilder::new().http2_only(true).build().unwrap();
        assert!(transport.is_http2_only());
    }

    #[cfg(feature = "tls")]
    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port nobody is listening on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = HyperTransport::new().unwrap();
        let request = Request::parse(&format!("http://127.0.0.1:{port}/")).unwrap();

        let err = transport.send(request, CancellationToken::new()).await.unwrap_err();

        assert!(err.is_transport(), "unexpected error: {err}");
        assert!(err.is_retryable());
    }

    #[cfg(feature = "tls")]
    #[tokio::test]
    async fn test_cancelled_before_send() {
        let transport = HyperTransport::new().unwrap();
        let request = Request::parse("http://127.0.0.1:9/").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = transport.send(request, cancel).await.unwrap_err();

        assert!(err.is_cancelled());
    }
}
