//! Configuration for the built-in interceptors.
//!
//! - [`RedirectPolicy`]: How many redirects to follow and whether to send `Referer`
//! - [`RetryPolicy`]: Retry behavior with exponential backoff

mod redirect;
mod retry;

pub use redirect::RedirectPolicy;
pub use retry::{ExponentialBackoff, RetryPolicy};

/// Default configuration values.
pub mod defaults {
    use std::time::Duration;

    /// Default maximum number of redirects to follow.
    pub const MAX_REDIRECTS: u32 = 10;

    /// Whether `Referer` is managed automatically by default.
    pub const AUTO_REFERRER: bool = true;

    /// Default initial delay before the first retry.
    pub const BASE_DELAY: Duration = Duration::from_secs(1);

    /// Default multiplier for exponential backoff.
    pub const MULTIPLIER: f64 = 1.6;

    /// Default jitter factor (0.2 means +/- 20%).
    pub const JITTER: f64 = 0.2;

    /// Default maximum delay between retries.
    pub const MAX_DELAY: Duration = Duration::from_secs(120);

    /// Default maximum number of retry attempts.
    pub const MAX_RETRIES: u32 = 3;
}
