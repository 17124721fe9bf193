//! Body type for requests handed to the transport and for responses.
//!
//! [`Body`] is a lazily readable byte stream that can be consumed exactly
//! once. It works with hyper through the [`http_body::Body`] trait.

use std::fmt;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use http_body::Frame;
use http_body_util::{BodyExt, BodyStream};

use crate::ClientError;

type BoxBodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// A message body.
///
/// This type can represent:
/// - Empty bodies (for GET requests and drained responses)
/// - Full bodies (all data available up front)
/// - Streaming bodies (data arriving from the transport)
///
/// The streaming variant sits behind a [`Mutex`] only so that `Body` is
/// `Sync`; it is polled through `&mut self` and never contended.
pub enum Body {
    /// Empty body.
    Empty,
    /// Full body with all data available.
    Full { data: Option<Bytes> },
    /// Streaming body from an async stream.
    Streaming { stream: Mutex<BoxBodyStream> },
}

impl Body {
    /// Create an empty body.
    pub fn empty() -> Self {
        Body::Empty
    }

    /// Create a body with the given data.
    pub fn full(data: impl Into<Bytes>) -> Self {
        Body::Full {
            data: Some(data.into()),
        }
    }

    /// Create a streaming body from the given stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, ClientError>> + Send + 'static,
    {
        Body::Streaming {
            stream: Mutex::new(Box::pin(stream)),
        }
    }

    /// Wrap any [`http_body::Body`], such as hyper's `Incoming`.
    ///
    /// Trailer frames are skipped; errors are mapped to [`ClientError::Body`].
    pub fn from_http_body<B>(body: B) -> Self
    where
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: fmt::Display + 'static,
    {
        let stream = BodyStream::new(body).filter_map(|frame| {
            futures::future::ready(match frame {
                Ok(frame) => frame.into_data().ok().map(Ok),
                Err(e) => Some(Err(ClientError::Body(e.to_string()))),
            })
        });
        Self::from_stream(stream)
    }

    /// Read the remaining body into memory.
    pub async fn bytes(&mut self) -> Result<Bytes, ClientError> {
        let collected = BodyExt::collect(&mut *self).await?;
        Ok(collected.to_bytes())
    }

    /// Read the body to exhaustion, discarding the data.
    ///
    /// Returns the number of bytes discarded. Draining a response body is
    /// what lets the transport reuse the underlying connection.
    pub async fn drain(&mut self) -> Result<u64, ClientError> {
        let mut discarded = 0u64;
        while let Some(frame) = self.frame().await {
            if let Ok(data) = frame?.into_data() {
                discarded += data.len() as u64;
            }
        }
        Ok(discarded)
    }
}

impl http_body::Body for Body {
    type Data = Bytes;
    type Error = ClientError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Body::Empty => Poll::Ready(None),
            Body::Full { data } => Poll::Ready(data.take().map(|d| Ok(Frame::data(d)))),
            Body::Streaming { stream } => {
                let stream = stream.get_mut().unwrap_or_else(PoisonError::into_inner);
                match stream.as_mut().poll_next(cx) {
                    Poll::Ready(Some(Ok(data))) => Poll::Ready(Some(Ok(Frame::data(data)))),
                    Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
                    Poll::Ready(None) => Poll::Ready(None),
                    Poll::Pending => Poll::Pending,
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Full { data } => data.is_none(),
            Body::Streaming { .. } => false, // Can't know without polling
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Body::Empty => http_body::SizeHint::with_exact(0),
            Body::Full { data } => {
                http_body::SizeHint::with_exact(data.as_ref().map_or(0, |d| d.len() as u64))
            }
            Body::Streaming { .. } => http_body::SizeHint::default(),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Empty
    }
}

impl From<Bytes> for Body {
    fn from(data: Bytes) -> Self {
        Body::full(data)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => write!(f, "Body::Empty"),
            Body::Full { data } => f
                .debug_struct("Body::Full")
                .field("data_len", &data.as_ref().map(|d| d.len()))
                .finish(),
            Body::Streaming { .. } => write!(f, "Body::Streaming"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body::Body as _;

    #[tokio::test]
    async fn test_empty_body() {
        let mut body = Body::empty();
        assert!(body.is_end_stream());
        assert!(body.bytes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_body_is_consumed_once() {
        let mut body = Body::full("hello world");
        assert_eq!(body.size_hint().exact(), Some(11));

        assert_eq!(body.bytes().await.unwrap(), Bytes::from("hello world"));
        assert!(body.is_end_stream());
        assert!(body.bytes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_streaming_body() {
        let chunks = vec![
            Ok(Bytes::from("chunk1")),
            Ok(Bytes::from("chunk2")),
            Ok(Bytes::from("chunk3")),
        ];
        let mut body = Body::from_stream(futures::stream::iter(chunks));

        assert_eq!(body.bytes().await.unwrap(), Bytes::from("chunk1chunk2chunk3"));
    }

    #[tokio::test]
    async fn test_drain_counts_discarded_bytes() {
        let chunks = vec![Ok(Bytes::from("abc")), Ok(Bytes::from("defg"))];
        let mut body = Body::from_stream(futures::stream::iter(chunks));

        assert_eq!(body.drain().await.unwrap(), 7);
        assert_eq!(body.drain().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_drain_surfaces_read_error() {
        let chunks = vec![
            Ok(Bytes::from("abc")),
            Err(ClientError::Body("connection reset".into())),
        ];
        let mut body = Body::from_stream(futures::stream::iter(chunks));

        let err = body.drain().await.unwrap_err();
        assert!(matches!(err, ClientError::Body(_)));
    }

    #[tokio::test]
    async fn test_from_http_body() {
        let inner = http_body_util::Full::new(Bytes::from("wrapped"));
        let mut body = Body::from_http_body(inner);
        assert_eq!(body.bytes().await.unwrap(), Bytes::from("wrapped"));
    }
}
