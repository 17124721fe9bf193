//! Redirect following.
//!
//! [`RedirectInterceptor`] is an application interceptor: it sees the
//! caller's request once and issues one downstream call per redirect leg,
//! strictly one after another. The response handed back to the caller links
//! to every earlier leg through [`Response::previous`].
//!
//! # Rules
//!
//! - Only 3xx responses with a parseable `Location` are followed, and never
//!   for `HEAD` requests. A malformed `Location` is not an error; the 3xx
//!   response is returned as-is.
//! - Same authority: the request is kept and re-targeted. 300-303 turn a
//!   non-GET request into a body-less GET; 307/308 keep method, body and
//!   headers.
//! - Different authority: a fresh GET with no headers and no body is sent,
//!   so credentials and payloads never follow a redirect to another host.
//! - With `auto_referrer`, `Referer` is set to the previous URI, except on an
//!   `https` to `http` downgrade, where it is removed.

use http::header::{CONTENT_LENGTH, CONTENT_TYPE, REFERER, TRANSFER_ENCODING};
use http::{HeaderValue, Method, StatusCode};
use tokio_util::sync::CancellationToken;
use waypoint_core::{ClientError, Request, Response, Uri};

use crate::client::{BoxFuture, cancellable};
use crate::config::RedirectPolicy;
use crate::interceptor::{Interceptor, Next};

/// An application interceptor that follows HTTP redirects.
///
/// # Example
///
/// ```ignore
/// use waypoint_client::{ClientBuilder, RedirectInterceptor, RedirectPolicy};
///
/// let redirects = RedirectInterceptor::new(RedirectPolicy::new().max_redirects(5))?;
/// let client = ClientBuilder::new(transport)
///     .with_interceptor(redirects)
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct RedirectInterceptor {
    policy: RedirectPolicy,
}

impl RedirectInterceptor {
    /// Create a redirect interceptor.
    ///
    /// Fails with [`ClientError::InvalidConfig`] if `max_redirects` is 0.
    pub fn new(policy: RedirectPolicy) -> Result<Self, ClientError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// Get the policy.
    pub fn policy(&self) -> &RedirectPolicy {
        &self.policy
    }

    async fn follow(
        &self,
        mut request: Request,
        cancel: CancellationToken,
        next: Next,
    ) -> Result<Response, ClientError> {
        let max_redirects = self.policy.max_redirects;
        let max_legs = u64::from(max_redirects) + 1;

        let mut original_uri = request.uri().clone();
        let mut previous: Option<Response> = None;
        let mut leg_count: u64 = 1;

        loop {
            let mut response = cancellable(&cancel, next.send(request.clone(), cancel.clone())).await?;
            if let Some(previous) = previous.take() {
                response = response.with_previous(previous);
            }

            let Some(redirect_uri) = resolve_redirect_target(&response) else {
                return Ok(response);
            };

            // The body must be read to the end before the connection can be reused.
            match cancellable(&cancel, response.drain()).await {
                Ok(_) => {}
                Err(ClientError::Cancelled) if cancel.is_cancelled() => {
                    return Err(ClientError::Cancelled);
                }
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        error = %_err,
                        location = %redirect_uri,
                        "failed to drain redirect body; returning response without following"
                    );
                    return Ok(response);
                }
            }

            leg_count += 1;
            if leg_count > max_legs {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    max_redirects,
                    status = %response.status(),
                    location = %redirect_uri,
                    "redirect limit reached"
                );
                return Err(ClientError::TooManyRedirects {
                    max: max_redirects,
                    response: Box::new(response),
                });
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(
                status = %response.status(),
                from = %original_uri,
                to = %redirect_uri,
                leg = leg_count,
                "following redirect"
            );

            request = derive_request(request, &original_uri, &redirect_uri, response.status());
            if self.policy.auto_referrer {
                request = apply_referrer(request, &original_uri, &redirect_uri);
            }
            previous = Some(response);
            original_uri = redirect_uri;
        }
    }
}

impl Default for RedirectInterceptor {
    fn default() -> Self {
        Self {
            policy: RedirectPolicy::default(),
        }
    }
}

impl Interceptor for RedirectInterceptor {
    fn intercept(
        &self,
        request: Request,
        cancel: CancellationToken,
        next: Next,
    ) -> BoxFuture<'_, Result<Response, ClientError>> {
        Box::pin(self.follow(request, cancel, next))
    }
}

/// Work out where `response` redirects to, if anywhere.
///
/// Returns `None` when the response is not a followable redirect: no
/// `Location`, a `HEAD` request, a status outside 300-399, or a request URI
/// or `Location` that does not parse as an HTTP URI.
///
/// A relative `Location` inherits host, port and scheme from the request.
/// When the request URI has a non-empty query, that query replaces whatever
/// query the `Location` carried.
pub fn resolve_redirect_target(response: &Response) -> Option<Uri> {
    let location = response.headers().get(http::header::LOCATION)?;
    let request = response.request();

    if request.method() == Method::HEAD {
        return None;
    }
    if !(300..=399).contains(&response.status().as_u16()) {
        return None;
    }

    let base = request.uri();
    if !base.is_absolute() {
        return None;
    }
    let location = Uri::parse(location.to_str().ok()?.trim()).ok()?;

    let mut resolved = base.resolve(&location).ok()?;
    if let Some(query) = base.query().filter(|q| !q.is_empty()) {
        resolved = resolved.with_query(Some(query));
    }

    Some(resolved)
}

/// Build the follow-up request for a redirect to `redirect_uri`.
fn derive_request(
    request: Request,
    original_uri: &Uri,
    redirect_uri: &Uri,
    status: StatusCode,
) -> Request {
    if redirect_uri.authority() != original_uri.authority() {
        return Request::new(redirect_uri.clone());
    }

    let request = request.with_uri(redirect_uri.clone());
    if (300..=303).contains(&status.as_u16()) && request.method() != Method::GET {
        return request
            .with_method(Method::GET)
            .without_body()
            .without_header(TRANSFER_ENCODING)
            .without_header(CONTENT_LENGTH)
            .without_header(CONTENT_TYPE);
    }
    request
}

/// Set or strip `Referer` on a follow-up request.
fn apply_referrer(request: Request, referrer: &Uri, destination: &Uri) -> Request {
    if referrer.is_secure() && !destination.is_secure() {
        return request.without_header(REFERER);
    }
    match HeaderValue::try_from(referrer.to_string()) {
        Ok(value) => request.with_header(REFERER, value),
        Err(_) => request.without_header(REFERER),
    }
}
