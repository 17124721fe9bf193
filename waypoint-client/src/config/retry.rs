//! Retry configuration with exponential backoff.
//!
//! Delays follow `base * multiplier^attempt`, randomized by +/- `jitter`
//! and capped at `max_delay`, in the style of the
//! [gRPC connection backoff specification](https://github.com/grpc/grpc/blob/master/doc/connection-backoff.md).

use std::time::Duration;

use waypoint_core::ClientError;

use super::defaults;

/// Configuration for [`RetryInterceptor`](crate::RetryInterceptor).
///
/// # Default Values
///
/// - `base_delay`: 1 second
/// - `multiplier`: 1.6
/// - `jitter`: 0.2 (20%)
/// - `max_delay`: 120 seconds
/// - `max_retries`: 3
///
/// # Example
///
/// ```
/// use waypoint_client::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .max_retries(5)
///     .base_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(30));
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Initial delay before the first retry.
    pub base_delay: Duration,

    /// Multiplier for exponential backoff. Must be >= 1.0.
    pub multiplier: f64,

    /// Jitter factor between 0.0 and 1.0. With 0.2 the actual delay lands
    /// within +/- 20% of the computed delay.
    pub jitter: f64,

    /// Upper bound for any single delay.
    pub max_delay: Duration,

    /// Maximum number of retry attempts (not counting the initial request).
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: defaults::BASE_DELAY,
            multiplier: defaults::MULTIPLIER,
            jitter: defaults::JITTER,
            max_delay: defaults::MAX_DELAY,
            max_retries: defaults::MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// Create a new RetryPolicy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Short delays for latency-sensitive calls: 50ms base, 1s cap, 5 retries.
    pub fn aggressive() -> Self {
        Self {
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            max_retries: 5,
            ..Default::default()
        }
    }

    /// Long delays for background work: 2s base, 5 minute cap, 10 retries.
    pub fn patient() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(300),
            max_retries: 10,
            ..Default::default()
        }
    }

    /// Set the maximum number of retry attempts.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial delay before the first retry.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the jitter factor.
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Validate the policy configuration.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.base_delay > self.max_delay {
            return Err(ClientError::InvalidConfig(
                "base_delay must not exceed max_delay".into(),
            ));
        }
        if !(self.multiplier >= 1.0) {
            return Err(ClientError::InvalidConfig("multiplier must be >= 1.0".into()));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ClientError::InvalidConfig(
                "jitter must be between 0.0 and 1.0".into(),
            ));
        }
        Ok(())
    }

    /// Start a fresh backoff sequence for this policy.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.clone())
    }
}

/// Exponential backoff state for one request.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use waypoint_client::RetryPolicy;
///
/// let mut backoff = RetryPolicy::new()
///     .base_delay(Duration::from_secs(1))
///     .multiplier(2.0)
///     .jitter(0.0)
///     .backoff();
///
/// assert_eq!(backoff.next_delay(), Duration::from_secs(1));
/// assert_eq!(backoff.next_delay(), Duration::from_secs(2));
/// ```
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    policy: RetryPolicy,
    /// Un-jittered delay for the next attempt, in seconds.
    current_secs: f64,
    attempts: u32,
}

impl ExponentialBackoff {
    /// Create a new backoff sequence.
    pub fn new(policy: RetryPolicy) -> Self {
        let current_secs = policy.base_delay.as_secs_f64();
        Self {
            policy,
            current_secs,
            attempts: 0,
        }
    }

    /// Number of delays handed out so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether another retry is allowed.
    pub fn can_retry(&self) -> bool {
        self.attempts < self.policy.max_retries
    }

    /// Get the next delay and advance the sequence.
    pub fn next_delay(&mut self) -> Duration {
        let max_secs = self.policy.max_delay.as_secs_f64();
        let jitter = self.policy.jitter;

        let factor = if jitter > 0.0 {
            1.0 + (rand::random::<f64>() * 2.0 - 1.0) * jitter
        } else {
            1.0
        };
        let delay = (self.current_secs * factor).min(max_secs).max(0.0);

        self.current_secs = (self.current_secs * self.policy.multiplier).min(max_secs);
        self.attempts += 1;

        Duration::from_secs_f64(delay)
    }
}

/// Yields one delay per allowed retry, then `None`.
impl Iterator for ExponentialBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.can_retry() {
            Some(self.next_delay())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert!((policy.multiplier - 1.6).abs() < f64::EPSILON);
        assert!((policy.jitter - 0.2).abs() < f64::EPSILON);
        assert_eq!(policy.max_delay, Duration::from_secs(120));
        assert_eq!(policy.max_retries, 3);
    }

    #[test]
    fn test_retry_policy_presets() {
        assert_eq!(RetryPolicy::no_retry().max_retries, 0);

        let aggressive = RetryPolicy::aggressive();
        assert_eq!(aggressive.base_delay, Duration::from_millis(50));
        assert_eq!(aggressive.max_retries, 5);

        let patient = RetryPolicy::patient();
        assert_eq!(patient.max_delay, Duration::from_secs(300));
        assert_eq!(patient.max_retries, 10);
    }

    #[test]
    fn test_retry_policy_validate() {
        assert!(RetryPolicy::default().validate().is_ok());

        let inverted = RetryPolicy::new()
            .base_delay(Duration::from_secs(10))
            .max_delay(Duration::from_secs(1));
        assert!(inverted.validate().is_err());

        assert!(RetryPolicy::new().multiplier(0.5).validate().is_err());
        assert!(RetryPolicy::new().multiplier(f64::NAN).validate().is_err());
        assert!(RetryPolicy::new().jitter(1.5).validate().is_err());
    }

    #[test]
    fn test_backoff_without_jitter() {
        let mut backoff = RetryPolicy::new()
            .base_delay(Duration::from_secs(1))
            .multiplier(2.0)
            .max_delay(Duration::from_secs(100))
            .jitter(0.0)
            .backoff();

        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
        assert_eq!(backoff.next_delay(), Duration::from_secs(4));
        assert_eq!(backoff.attempts(), 3);
    }

    #[test]
    fn test_backoff_clamps_to_max_delay() {
        let mut backoff = RetryPolicy::new()
            .base_delay(Duration::from_secs(10))
            .multiplier(10.0)
            .max_delay(Duration::from_secs(15))
            .jitter(0.0)
            .backoff();

        assert_eq!(backoff.next_delay(), Duration::from_secs(10));
        assert_eq!(backoff.next_delay(), Duration::from_secs(15));
        assert_eq!(backoff.next_delay(), Duration::from_secs(15));
    }

    #[test]
    fn test_backoff_jitter_bounds() {
        let mut backoff = RetryPolicy::new()
            .base_delay(Duration::from_secs(1))
            .jitter(0.2)
            .backoff();

        let delay = backoff.next_delay();
        assert!(delay >= Duration::from_millis(800));
        assert!(delay <= Duration::from_millis(1200));
    }

    #[test]
    fn test_backoff_can_retry() {
        let mut backoff = RetryPolicy::new().max_retries(2).jitter(0.0).backoff();

        assert!(backoff.can_retry());
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert!(backoff.can_retry());
        backoff.next_delay();
        assert_eq!(backoff.attempts(), 2);
        assert!(!backoff.can_retry());
    }

    #[test]
    fn test_backoff_as_iterator() {
        let delays: Vec<_> = RetryPolicy::new()
            .max_retries(3)
            .multiplier(2.0)
            .jitter(0.0)
            .backoff()
            .collect();

        assert_eq!(
            delays,
            vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
        );
    }
}
