//! HTTP URI values.
//!
//! [`Uri`] is an immutable view over an `http`/`https` URL or a relative
//! reference (as found in a `Location` header). Parsing and RFC 3986
//! reference resolution are delegated to [`url::Url`]; this type restricts
//! absolute values to the two HTTP schemes, keeps relative references
//! around until they are resolved, and offers derivation methods that
//! return new values instead of mutating in place.

use std::fmt;
use std::str::FromStr;

use url::Url;

/// Errors produced while parsing or converting a [`Uri`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UriError {
    #[error("empty uri")]
    Empty,

    #[error("invalid uri {input:?}: {reason}")]
    Invalid { input: String, reason: String },

    #[error("unsupported uri scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("missing host in uri {0:?}")]
    MissingHost(String),

    #[error("uri {0:?} is not absolute")]
    NotAbsolute(String),
}

impl UriError {
    fn invalid(input: &str, reason: impl fmt::Display) -> Self {
        UriError::Invalid {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// The transport scheme of an HTTP URI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    /// Get the lowercase string form of this scheme.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// Whether traffic using this scheme is encrypted.
    pub fn is_secure(&self) -> bool {
        matches!(self, Scheme::Https)
    }
}

impl FromStr for Scheme {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("http") {
            Ok(Scheme::Http)
        } else if s.eq_ignore_ascii_case("https") {
            Ok(Scheme::Https)
        } else {
            Err(UriError::UnsupportedScheme(s.to_string()))
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host plus optional explicit port.
///
/// Two authorities are equal when their hosts match (ignoring ASCII case)
/// and their ports are identical. A port equal to the scheme's default is
/// dropped while parsing, so `https://a.example:443` has no explicit port.
#[derive(Clone, Debug)]
pub struct Authority {
    host: String,
    port: Option<u16>,
}

impl Authority {
    /// Create a new authority.
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Get the host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the explicit port, if any.
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

impl PartialEq for Authority {
    fn eq(&self, other: &Self) -> bool {
        self.host.eq_ignore_ascii_case(&other.host) && self.port == other.port
    }
}

impl Eq for Authority {}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => f.write_str(&self.host),
        }
    }
}

/// An HTTP URI or relative reference.
///
/// Absolute values always carry an `http`/`https` scheme and a host.
/// Relative references (`/next`, `next`, `?page=2`, `//cdn.example/x`) only
/// expose their path and query; [`Uri::resolve`] turns them into absolute
/// values against a base. Fragments are never kept, since they are not sent
/// over the wire.
///
/// # Example
///
/// ```
/// use waypoint_core::{Scheme, Uri};
///
/// let base = Uri::parse("https://a.example:8443/docs/index?lang=en").unwrap();
/// assert_eq!(base.scheme(), Some(Scheme::Https));
/// assert_eq!(base.host(), Some("a.example"));
/// assert_eq!(base.port(), Some(8443));
/// assert_eq!(base.query(), Some("lang=en"));
///
/// let location = Uri::parse("../moved").unwrap();
/// assert!(!location.is_absolute());
/// let resolved = base.resolve(&location).unwrap();
/// assert_eq!(resolved.to_string(), "https://a.example:8443/moved");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Uri {
    repr: Repr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Repr {
    Absolute(Url),
    Relative(String),
}

impl Uri {
    /// Parse an absolute HTTP URI or a relative reference.
    pub fn parse(input: &str) -> Result<Self, UriError> {
        if input.is_empty() {
            return Err(UriError::Empty);
        }

        match Url::parse(input) {
            Ok(url) => Self::try_from(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let reference = input.split('#').next().unwrap_or_default();
                Ok(Self {
                    repr: Repr::Relative(reference.to_string()),
                })
            }
            Err(url::ParseError::EmptyHost) => Err(UriError::MissingHost(input.to_string())),
            Err(e) => Err(UriError::invalid(input, e)),
        }
    }

    /// Get the underlying [`Url`] of an absolute value.
    pub fn as_url(&self) -> Option<&Url> {
        match &self.repr {
            Repr::Absolute(url) => Some(url),
            Repr::Relative(_) => None,
        }
    }

    fn absolute(&self) -> Result<&Url, UriError> {
        match &self.repr {
            Repr::Absolute(url) => Ok(url),
            Repr::Relative(reference) => Err(UriError::NotAbsolute(reference.clone())),
        }
    }

    /// Get the scheme, if present.
    pub fn scheme(&self) -> Option<Scheme> {
        self.as_url().and_then(|url| url.scheme().parse().ok())
    }

    /// Get the host, if present.
    pub fn host(&self) -> Option<&str> {
        self.as_url().and_then(Url::host_str)
    }

    /// Get the explicit port, if present.
    pub fn port(&self) -> Option<u16> {
        self.as_url().and_then(Url::port)
    }

    /// Get the authority (host and explicit port), if a host is present.
    pub fn authority(&self) -> Option<Authority> {
        self.host().map(|host| Authority::new(host, self.port()))
    }

    /// Get the path. Empty for query-only references.
    pub fn path(&self) -> &str {
        match &self.repr {
            Repr::Absolute(url) => url.path(),
            Repr::Relative(reference) => split_reference(reference).0,
        }
    }

    /// Get the query string without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        match &self.repr {
            Repr::Absolute(url) => url.query(),
            Repr::Relative(reference) => split_reference(reference).1,
        }
    }

    /// Whether both a scheme and a host are present.
    pub fn is_absolute(&self) -> bool {
        matches!(self.repr, Repr::Absolute(_))
    }

    /// Whether the scheme is `https`.
    pub fn is_secure(&self) -> bool {
        self.scheme().is_some_and(|s| s.is_secure())
    }

    /// Return a copy with the given scheme.
    pub fn with_scheme(&self, scheme: Scheme) -> Result<Self, UriError> {
        let mut url = self.absolute()?.clone();
        url.set_scheme(scheme.as_str())
            .map_err(|()| UriError::invalid(url.as_str(), "cannot change scheme"))?;
        Self::try_from(url)
    }

    /// Return a copy with the given host.
    pub fn with_host(&self, host: &str) -> Result<Self, UriError> {
        let mut url = self.absolute()?.clone();
        url.set_host(Some(host))
            .map_err(|e| UriError::invalid(host, e))?;
        Self::try_from(url)
    }

    /// Return a copy with the given explicit port.
    pub fn with_port(&self, port: Option<u16>) -> Result<Self, UriError> {
        let mut url = self.absolute()?.clone();
        url.set_port(port)
            .map_err(|()| UriError::invalid(url.as_str(), "cannot set port"))?;
        Self::try_from(url)
    }

    /// Return a copy with the given query (`None` removes it).
    pub fn with_query(&self, query: Option<&str>) -> Self {
        let repr = match &self.repr {
            Repr::Absolute(url) => {
                let mut url = url.clone();
                url.set_query(query);
                Repr::Absolute(url)
            }
            Repr::Relative(reference) => {
                let path = split_reference(reference).0;
                Repr::Relative(match query {
                    Some(query) => format!("{path}?{query}"),
                    None => path.to_string(),
                })
            }
        };
        Self { repr }
    }

    /// Resolve `reference` against this URI.
    ///
    /// An absolute `reference` is returned unchanged. A relative one inherits
    /// whatever it lacks (scheme, host and port, path) from `self`, following
    /// RFC 3986 section 5.2. Fails if `self` is not absolute or the result is
    /// not an HTTP URI.
    pub fn resolve(&self, reference: &Uri) -> Result<Self, UriError> {
        match &reference.repr {
            Repr::Absolute(_) => Ok(reference.clone()),
            Repr::Relative(relative) => {
                let joined = self
                    .absolute()?
                    .join(relative)
                    .map_err(|e| UriError::invalid(relative, e))?;
                Self::try_from(joined)
            }
        }
    }

    /// Convert an absolute value into an [`http::Uri`].
    pub fn to_http_uri(&self) -> Result<http::Uri, UriError> {
        let url = self.absolute()?;
        http::Uri::from_str(url.as_str()).map_err(|e| UriError::invalid(url.as_str(), e))
    }
}

/// Split a relative reference into path and query.
fn split_reference(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (reference, None),
    }
}

impl TryFrom<Url> for Uri {
    type Error = UriError;

    fn try_from(mut url: Url) -> Result<Self, Self::Error> {
        url.scheme().parse::<Scheme>()?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(UriError::MissingHost(url.to_string()));
        }
        url.set_fragment(None);
        Ok(Self {
            repr: Repr::Absolute(url),
        })
    }
}

impl FromStr for Uri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uri::parse(s)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Absolute(url) => f.write_str(url.as_str()),
            Repr::Relative(reference) => f.write_str(reference),
        }
    }
}
