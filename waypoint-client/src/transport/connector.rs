//! TLS connector setup for the hyper transport.
//!
//! TLS needs both a crypto provider and a set of root certificates:
//!
//! - **Crypto providers** (choose one):
//!   - `tls-ring` - Use ring crypto (default with `tls` feature)
//!   - `tls-aws-lc` - Use AWS LC crypto
//!   - neither: fall back to a provider installed with
//!     `rustls::crypto::CryptoProvider::install_default()`
//!
//! - **Root certificates** (choose one):
//!   - `tls-native-roots` - Use system root certificates (default with `tls` feature)
//!   - `tls-webpki-roots` - Use bundled Mozilla root certificates

use std::sync::Arc;

use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use rustls::ClientConfig;
use waypoint_core::ClientError;

type ConfigBuilder = rustls::ConfigBuilder<ClientConfig, rustls::WantsVerifier>;

/// Whether the enabled features are enough to build a default TLS config.
#[inline]
pub const fn has_tls_support() -> bool {
    cfg!(any(feature = "tls-ring", feature = "tls-aws-lc"))
        && cfg!(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))
}

fn with_provider(provider: Arc<rustls::crypto::CryptoProvider>) -> Result<ConfigBuilder, ClientError> {
    ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ClientError::InvalidConfig(format!("unusable TLS crypto provider: {e}")))
}

/// Pick a crypto provider: a feature-gated one first, then the process-wide
/// default.
#[cfg(feature = "tls-ring")]
fn crypto_provider_builder() -> Result<ConfigBuilder, ClientError> {
    with_provider(Arc::new(rustls::crypto::ring::default_provider()))
}

#[cfg(all(feature = "tls-aws-lc", not(feature = "tls-ring")))]
fn crypto_provider_builder() -> Result<ConfigBuilder, ClientError> {
    with_provider(Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}

#[cfg(not(any(feature = "tls-ring", feature = "tls-aws-lc")))]
fn crypto_provider_builder() -> Result<ConfigBuilder, ClientError> {
    match rustls::crypto::CryptoProvider::get_default() {
        Some(provider) => with_provider(provider.clone()),
        None => Err(ClientError::InvalidConfig(
            "HTTPS requires a crypto provider: enable `tls-ring` or `tls-aws-lc`, \
             or install one with CryptoProvider::install_default()"
                .into(),
        )),
    }
}

/// Build the root certificate store from enabled features.
///
/// Native roots win when both root features are enabled.
#[cfg(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))]
fn build_root_store() -> rustls::RootCertStore {
    let mut roots = rustls::RootCertStore::empty();

    #[cfg(feature = "tls-native-roots")]
    {
        let native_certs = rustls_native_certs::load_native_certs();
        if !native_certs.errors.is_empty() {
            // Some certs may still have loaded.
            #[cfg(feature = "tracing")]
            tracing::debug!("errors loading native certs: {:?}", native_certs.errors);
        }
        roots.add_parsable_certificates(native_certs.certs);
    }

    #[cfg(all(feature = "tls-webpki-roots", not(feature = "tls-native-roots")))]
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    roots
}

/// Build the default TLS configuration from the enabled features.
#[cfg(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))]
pub fn default_tls_config() -> Result<ClientConfig, ClientError> {
    Ok(crypto_provider_builder()?
        .with_root_certificates(build_root_store())
        .with_no_client_auth())
}

/// Build the default TLS configuration from the enabled features.
#[cfg(not(any(feature = "tls-native-roots", feature = "tls-webpki-roots")))]
pub fn default_tls_config() -> Result<ClientConfig, ClientError> {
    // A missing provider is reported before missing roots.
    crypto_provider_builder()?;
    Err(ClientError::InvalidConfig(
        "HTTPS requires root certificates: enable `tls-native-roots` or \
         `tls-webpki-roots`, or pass a TLS config to the transport builder"
            .into(),
    ))
}

/// Build a connector that speaks plain HTTP and HTTPS, negotiating HTTP/1.1
/// or HTTP/2 over ALPN.
pub fn build_https_connector(config: ClientConfig) -> HttpsConnector<HttpConnector> {
    HttpsConnectorBuilder::new()
        .with_tls_config(config)
        .https_or_http()
        .enable_all_versions()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tls_config_matches_features() {
        assert_eq!(default_tls_config().is_ok(), has_tls_support());
    }
}
