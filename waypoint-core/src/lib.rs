//! Core value types for the waypoint HTTP client.
//!
//! This crate provides the types shared by interceptors and transports in
//! `waypoint-client`.
//!
//! ## Modules
//!
//! - [`uri`]: HTTP URI parsing and immutable derivation
//! - [`body`]: Exactly-once readable message bodies
//! - [`request`]: Immutable request values
//! - [`response`]: Responses and their redirect history
//! - [`error`]: The shared client error type

pub mod body;
pub mod error;
pub mod request;
pub mod response;
pub mod uri;

pub use body::Body;
pub use error::ClientError;
pub use request::Request;
pub use response::Response;
pub use uri::{Authority, Scheme, Uri, UriError};
