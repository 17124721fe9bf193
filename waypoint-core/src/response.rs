//! HTTP response values and redirect history.

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, StatusCode, header};

use crate::body::Body;
use crate::error::ClientError;
use crate::request::Request;

/// An HTTP response.
///
/// Besides status, headers and body, a response remembers the request that
/// produced it and, when it ended a redirect chain, the response that came
/// before it. The chain is a singly linked list: [`Response::previous`]
/// walks from the newest leg towards the original request.
///
/// The body can be read exactly once. Intermediate responses in a redirect
/// chain have already been drained.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
    request: Arc<Request>,
    previous: Option<Box<Response>>,
}

impl Response {
    /// Create a new response for `request`.
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: Body,
        request: impl Into<Arc<Request>>,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            request: request.into(),
            previous: None,
        }
    }

    /// Create a response from an [`http::Response`] produced by a transport.
    pub fn from_http(response: http::Response<Body>, request: impl Into<Arc<Request>>) -> Self {
        let (parts, body) = response.into_parts();
        Self::new(parts.status, parts.headers, body, request)
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the request that produced this response.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Get the `Location` header, if present and valid UTF-8.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    /// Whether the status is in the 3xx range.
    pub fn is_redirection(&self) -> bool {
        self.status.is_redirection()
    }

    /// Get the response that preceded this one in a redirect chain.
    pub fn previous(&self) -> Option<&Response> {
        self.previous.as_deref()
    }

    /// Return this response linked to the response that preceded it.
    pub fn with_previous(self, previous: Response) -> Self {
        Self {
            previous: Some(Box::new(previous)),
            ..self
        }
    }

    /// Iterate over earlier responses, newest first.
    pub fn history(&self) -> impl Iterator<Item = &Response> {
        std::iter::successors(self.previous(), |response| response.previous())
    }

    /// Number of responses that preceded this one.
    pub fn redirect_count(&self) -> usize {
        self.history().count()
    }

    /// Get a mutable reference to the body.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Consume the response, returning the body.
    pub fn into_body(self) -> Body {
        self.body
    }

    /// Read the remaining body into memory.
    pub async fn bytes(&mut self) -> Result<Bytes, ClientError> {
        self.body.bytes().await
    }

    /// Read the body to exhaustion, discarding the data.
    pub async fn drain(&mut self) -> Result<u64, ClientError> {
        self.body.drain().await
    }
}
