//! Interceptor pipeline and redirect following for Rust HTTP clients.
//!
//! This crate assembles a request pipeline from a base transport and two
//! ordered lists of interceptors, and ships the interceptors most clients
//! need: redirect following, retries and static headers.
//!
//! ## Features
//!
//! - Application interceptors (run once per caller request, in registration order)
//! - Network interceptors (run once per transport exchange, including each redirect leg)
//! - Redirect following with method downgrade, cross-host header stripping
//!   and `Referer` management
//! - Retries of idempotent requests with exponential backoff
//! - Cooperative cancellation through [`CancellationToken`]
//! - A hyper + rustls transport with connection pooling
//!
//! ## Example
//!
//! ```ignore
//! use waypoint_client::{ClientBuilder, HeaderInterceptor, HyperTransport, RedirectPolicy};
//! use waypoint_client::Request;
//!
//! let client = ClientBuilder::new(HyperTransport::new()?)
//!     .with_interceptor(HeaderInterceptor::new("user-agent", "waypoint/0.1"))
//!     .follow_redirects(RedirectPolicy::default())?
//!     .build();
//!
//! let mut response = client.execute(Request::parse("https://example.com/old")?).await?;
//! println!("{} after {} redirects", response.status(), response.redirect_count());
//! let body = response.bytes().await?;
//! ```
//!
//! ## Redirect Semantics
//!
//! The [`RedirectInterceptor`] follows `Location` on any 3xx response except
//! for `HEAD` requests. Each intermediate response body is drained before
//! the next leg so pooled connections can be reused.
//!
//! | Status        | Same host, non-GET         | Different host              |
//! |---------------|----------------------------|-----------------------------|
//! | 300-303       | Becomes a bare `GET`       | Fresh `GET`, no headers     |
//! | 307, 308      | Method and body preserved  | Fresh `GET`, no headers     |
//!
//! A host or port change always produces a fresh request so credentials
//! never leak to another origin. When more than `max_redirects` redirects
//! would be needed, the call fails with [`ClientError::TooManyRedirects`],
//! which still carries the last response.
//!
//! ## Cancellation
//!
//! ```ignore
//! use waypoint_client::{CancellationToken, Client};
//!
//! let cancel = CancellationToken::new();
//! let call = client.send(request, cancel.clone());
//! cancel.cancel();
//! assert!(call.await.unwrap_err().is_cancelled());
//! ```
//!
//! ## Cargo Features
//!
//! | Feature            | Default | Description                                        |
//! |--------------------|---------|----------------------------------------------------|
//! | `tls`              | yes     | `tls-ring` + `tls-native-roots`                    |
//! | `tls-ring`         |         | ring crypto provider                               |
//! | `tls-aws-lc`       |         | AWS LC crypto provider                             |
//! | `tls-native-roots` |         | System root certificates                           |
//! | `tls-webpki-roots` |         | Bundled Mozilla root certificates                  |
//! | `tracing`          | yes     | Debug events for redirects, retries and exchanges  |

mod builder;
mod client;
pub mod config;
mod interceptor;
mod redirect;
mod retry;
pub mod transport;

pub use builder::{ClientBuilder, Pipeline};
pub use client::{BoxFuture, Client, ClientFn, client_fn};
pub use interceptor::{FnInterceptor, HeaderInterceptor, Interceptor, Next};
pub use redirect::{RedirectInterceptor, resolve_redirect_target};
pub use retry::RetryInterceptor;

// Re-export from config module
pub use config::{ExponentialBackoff, RedirectPolicy, RetryPolicy, defaults};

// Re-export transport types at the top level for convenience
pub use transport::{HyperTransport, HyperTransportBuilder, TlsClientConfig};

// Re-export core types that users need
pub use waypoint_core::{Authority, Body, ClientError, Request, Response, Scheme, Uri, UriError};

pub use tokio_util::sync::CancellationToken;

// Request bodies are built from these
pub use bytes::Bytes;
