//! Immutable HTTP request values.

use bytes::Bytes;
use http::header::{AsHeaderName, HeaderName, HeaderValue};
use http::{HeaderMap, Method};

use crate::body::Body;
use crate::error::ClientError;
use crate::uri::{Uri, UriError};

/// An HTTP request.
///
/// Requests are values: every `with_*`/`without_*` method consumes the
/// request and returns a new one, so an interceptor that keeps a copy of
/// the incoming request never observes later rewrites.
///
/// The body is held in memory as [`Bytes`] so that a request can be sent
/// more than once (307/308 redirects and retries replay it).
///
/// # Example
///
/// ```
/// use http::Method;
/// use waypoint_core::Request;
///
/// let request = Request::parse("https://api.example/items")
///     .unwrap()
///     .with_method(Method::POST)
///     .with_header(http::header::CONTENT_TYPE, "application/json".parse().unwrap())
///     .with_body(r#"{"name":"widget"}"#);
///
/// assert_eq!(request.method(), Method::POST);
/// assert!(request.body().is_some());
/// ```
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    /// Create a GET request with no headers and no body.
    pub fn new(uri: Uri) -> Self {
        Self {
            method: Method::GET,
            uri,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Parse `uri` and create a GET request for it.
    ///
    /// Fails unless `uri` is an absolute `http` or `https` URI.
    pub fn parse(uri: &str) -> Result<Self, UriError> {
        let uri = Uri::parse(uri)?;
        if !uri.is_absolute() {
            return Err(UriError::NotAbsolute(uri.to_string()));
        }
        Ok(Self::new(uri))
    }

    /// Get the method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the target URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Get the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the body, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Return this request with a different method.
    pub fn with_method(self, method: Method) -> Self {
        Self { method, ..self }
    }

    /// Return this request with a different target URI.
    pub fn with_uri(self, uri: Uri) -> Self {
        Self { uri, ..self }
    }

    /// Return this request with `name` set to `value`, replacing any
    /// existing values.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Return this request with `value` appended to the values of `name`.
    pub fn with_appended_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Return this request with every value of `name` removed.
    pub fn without_header<K: AsHeaderName>(mut self, name: K) -> Self {
        self.headers.remove(name);
        self
    }

    /// Return this request with the given body.
    pub fn with_body(self, body: impl Into<Bytes>) -> Self {
        Self {
            body: Some(body.into()),
            ..self
        }
    }

    /// Return this request without a body.
    pub fn without_body(self) -> Self {
        Self { body: None, ..self }
    }

    /// Build the [`http::Request`] handed to a transport.
    pub fn to_http(&self) -> Result<http::Request<Body>, ClientError> {
        let body = match &self.body {
            Some(data) => Body::full(data.clone()),
            None => Body::empty(),
        };

        let mut request = http::Request::new(body);
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.uri.to_http_uri()?;
        *request.headers_mut() = self.headers.clone();
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header;

    fn request() -> Request {
        Request::parse("http://a.example/items?page=1").unwrap()
    }

    #[test]
    fn test_new_request_defaults() {
        let request = request();
        assert_eq!(request.method(), Method::GET);
        assert!(request.headers().is_empty());
        assert!(request.body().is_none());
    }

    #[test]
    fn test_parse_requires_absolute_uri() {
        assert!(matches!(
            Request::parse("/relative"),
            Err(UriError::NotAbsolute(_))
        ));
    }

    #[test]
    fn test_derivation_returns_new_values() {
        let original = request().with_header(header::ACCEPT, HeaderValue::from_static("*/*"));
        let derived = original
            .clone()
            .with_method(Method::POST)
            .with_body("payload")
            .without_header(header::ACCEPT);

        assert_eq!(original.method(), Method::GET);
        assert!(original.headers().contains_key(header::ACCEPT));
        assert!(original.body().is_none());

        assert_eq!(derived.method(), Method::POST);
        assert!(!derived.headers().contains_key(header::ACCEPT));
        assert_eq!(derived.body().unwrap(), &Bytes::from("payload"));
        assert!(derived.without_body().body().is_none());
    }

    #[test]
    fn test_multi_valued_headers() {
        let request = request()
            .with_appended_header(header::ACCEPT, HeaderValue::from_static("text/html"))
            .with_appended_header(header::ACCEPT, HeaderValue::from_static("text/plain"));
        assert_eq!(request.headers().get_all(header::ACCEPT).iter().count(), 2);

        let replaced = request.with_header(header::ACCEPT, HeaderValue::from_static("*/*"));
        assert_eq!(replaced.headers().get_all(header::ACCEPT).iter().count(), 1);
    }

    #[tokio::test]
    async fn test_to_http() {
        let request = request()
            .with_method(Method::PUT)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_body("data");

        let mut http_request = request.to_http().unwrap();
        assert_eq!(http_request.method(), Method::PUT);
        assert_eq!(http_request.uri().to_string(), "http://a.example/items?page=1");
        assert_eq!(http_request.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(http_request.body_mut().bytes().await.unwrap(), Bytes::from("data"));

        // The request itself can be sent again.
        assert!(request.to_http().is_ok());
    }
}
