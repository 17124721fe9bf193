//! Client-side error types.
//!
//! This module provides [`ClientError`], the error type shared by every layer
//! of the request pipeline: value types, interceptors and transports.

use crate::response::Response;
use crate::uri::UriError;

/// Client-side error variants.
///
/// Callers can tell apart errors they caused ([`ClientError::Cancelled`],
/// [`ClientError::InvalidConfig`]), failures on the wire
/// ([`ClientError::Transport`], [`ClientError::Body`]) and the redirect
/// limit, which keeps the last response so the chain can be inspected.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A component was configured with values it cannot work with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A URI could not be parsed or converted for the transport.
    #[error("invalid uri: {0}")]
    InvalidUri(#[from] UriError),

    /// The redirect limit was reached while the server still asked for more.
    ///
    /// `response` is the last response received; its previous-response
    /// chain holds the full redirect history.
    #[error("exceeded {max} redirects, last response was {}", .response.status())]
    TooManyRedirects { max: u32, response: Box<Response> },

    /// The caller cancelled the operation.
    #[error("request cancelled")]
    Cancelled,

    /// Transport-level error (connection failed, reset, etc.).
    #[error("transport error: {0}")]
    Transport(String),

    /// Reading a body failed.
    #[error("body error: {0}")]
    Body(String),
}

impl ClientError {
    /// Whether the caller cancelled the operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    /// Whether this is a transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// Whether this is the redirect-limit error.
    pub fn is_too_many_redirects(&self) -> bool {
        matches!(self, ClientError::TooManyRedirects { .. })
    }

    /// Returns whether this error indicates a transient condition that may
    /// be resolved by retrying.
    ///
    /// Only transport failures qualify. Cancellation, configuration and
    /// redirect-limit errors would fail the same way again.
    pub fn is_retryable(&self) -> bool {
        self.is_transport()
    }

    /// Borrow the response attached to a redirect-limit error.
    pub fn response(&self) -> Option<&Response> {
        match self {
            ClientError::TooManyRedirects { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Take the response attached to a redirect-limit error.
    pub fn into_response(self) -> Option<Response> {
        match self {
            ClientError::TooManyRedirects { response, .. } => Some(*response),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Body, Request, Uri};
    use http::{HeaderMap, StatusCode};

    fn redirect_response() -> Response {
        let request = Request::new(Uri::parse("http://a.example/").unwrap());
        Response::new(StatusCode::FOUND, HeaderMap::new(), Body::empty(), request)
    }

    #[test]
    fn test_error_classification() {
        assert!(ClientError::Cancelled.is_cancelled());
        assert!(!ClientError::Cancelled.is_retryable());

        let transport = ClientError::Transport("connection reset".into());
        assert!(transport.is_transport());
        assert!(transport.is_retryable());

        assert!(!ClientError::Body("truncated".into()).is_retryable());
        assert!(!ClientError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_too_many_redirects_keeps_response() {
        let err = ClientError::TooManyRedirects {
            max: 3,
            response: Box::new(redirect_response()),
        };
        assert!(err.is_too_many_redirects());
        assert_eq!(err.to_string(), "exceeded 3 redirects, last response was 302 Found");
        assert_eq!(err.response().unwrap().status(), StatusCode::FOUND);

        let response = err.into_response().unwrap();
        assert_eq!(response.request().uri().to_string(), "http://a.example/");
    }

    #[test]
    fn test_from_uri_error() {
        let err: ClientError = UriError::Empty.into();
        assert!(matches!(err, ClientError::InvalidUri(UriError::Empty)));
        assert_eq!(err.to_string(), "invalid uri: empty uri");
    }

    #[test]
    fn test_client_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<ClientError>();
    }
}
