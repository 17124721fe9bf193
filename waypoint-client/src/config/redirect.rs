//! Redirect-following configuration.

use waypoint_core::ClientError;

use super::defaults;

/// Configuration for [`RedirectInterceptor`](crate::RedirectInterceptor).
///
/// # Example
///
/// ```
/// use waypoint_client::RedirectPolicy;
///
/// let policy = RedirectPolicy::new().max_redirects(5).auto_referrer(false);
/// assert!(policy.validate().is_ok());
///
/// assert!(RedirectPolicy::new().max_redirects(0).validate().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectPolicy {
    /// Maximum number of redirects to follow. Must be at least 1.
    ///
    /// A request makes at most `max_redirects + 1` exchanges in total.
    pub max_redirects: u32,

    /// Set or strip the `Referer` header on each follow-up request.
    pub auto_referrer: bool,
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self {
            max_redirects: defaults::MAX_REDIRECTS,
            auto_referrer: defaults::AUTO_REFERRER,
        }
    }
}

impl RedirectPolicy {
    /// Create a new RedirectPolicy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of redirects to follow.
    pub fn max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Enable or disable automatic `Referer` handling.
    pub fn auto_referrer(mut self, enabled: bool) -> Self {
        self.auto_referrer = enabled;
        self
    }

    /// Validate the policy configuration.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.max_redirects < 1 {
            return Err(ClientError::InvalidConfig(
                "max_redirects must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_policy_default() {
        let policy = RedirectPolicy::default();
        assert_eq!(policy.max_redirects, 10);
        assert!(policy.auto_referrer);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_redirect_policy_builder() {
        let policy = RedirectPolicy::new().max_redirects(1).auto_referrer(false);
        assert_eq!(policy.max_redirects, 1);
        assert!(!policy.auto_referrer);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_redirect_policy_rejects_zero() {
        let err = RedirectPolicy::new().max_redirects(0).validate().unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }
}
