//! HTTP transport layer.
//!
//! This module provides the [`HyperTransport`] type, the base of every
//! production pipeline. It supports:
//!
//! - HTTP/1.1 and HTTP/2 with automatic protocol negotiation
//! - TLS with rustls (feature-gated)
//! - Connection pooling
//!
//! Any other [`Client`](crate::Client) implementation can stand in for it,
//! for example a [`client_fn`](crate::client_fn) stub in tests.
//!
//! # Example
//!
//! ```ignore
//! use waypoint_client::{HyperTransport, HyperTransportBuilder};
//! use std::time::Duration;
//!
//! // Create with default settings (uses default TLS if features enabled)
//! let transport = HyperTransport::new()?;
//!
//! // Or use the builder for customization
//! let transport = HyperTransportBuilder::new()
//!     .pool_idle_timeout(Duration::from_secs(60))
//!     .build()?;
//! ```

mod connector;
mod hyper;

pub use connector::{build_https_connector, default_tls_config, has_tls_support};
pub use hyper::{HyperTransport, HyperTransportBuilder};

// Re-export rustls types that users might need for TLS configuration
pub use rustls::ClientConfig as TlsClientConfig;
