//! Access token representation and expiry logic.

use secrecy::{ExposeSecret as _, SecretString};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds of slack applied before an expiry instant, so a token is not
/// handed to the upstream moments before it lapses.
const EXPIRY_SKEW_SECS: u64 = 30;

/// Current UNIX time in whole seconds.
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// An OAuth access token obtained from the authorization-code exchange.
///
/// The secret is only reachable through [`AccessToken::bearer_header`] and
/// [`AccessToken::expose`]; `Debug` output redacts it. The type deliberately
/// has no `Serialize` impl.
#[derive(Debug)]
pub struct AccessToken {
    secret: SecretString,
    token_type: Option<String>,
    expires_at: Option<u64>,
}

impl AccessToken {
    /// Create a token with no expiry and no declared type.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
            token_type: None,
            expires_at: None,
        }
    }

    /// Set the expiry to `expires_in_secs` seconds from now.
    #[must_use]
    pub fn with_expiry(mut self, expires_in_secs: u64) -> Self {
        self.expires_at = Some(unix_now().saturating_add(expires_in_secs));
        self
    }

    /// Set an absolute expiry (UNIX seconds).
    #[must_use]
    pub fn with_expires_at(mut self, expires_at: u64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Record the `token_type` reported by the token endpoint.
    #[must_use]
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = Some(token_type.into());
        self
    }

    /// The raw secret. Callers must not log or serialize the result.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }

    /// `Authorization` header value for upstream calls.
    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.expose())
    }

    #[must_use]
    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<u64> {
        self.expires_at
    }

    /// Return `true` if the token expires within the skew window at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at
            .is_some_and(|exp| now.saturating_add(EXPIRY_SKEW_SECS) >= exp)
    }

    /// Return `true` if the token is expired as of the current clock.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_no_expiry() {
        let t = AccessToken::new("tok");
        assert!(!t.is_expired());
        assert!(t.expires_at().is_none());
    }

    #[test]
    fn test_valid_future_expiry() {
        let t = AccessToken::new("tok").with_expiry(3600);
        assert!(!t.is_expired());
    }

    #[test]
    fn test_expired_in_past() {
        let t = AccessToken::new("tok").with_expires_at(unix_now().saturating_sub(100));
        assert!(t.is_expired());
    }

    #[test]
    fn test_near_expiry_treated_as_expired() {
        let t = AccessToken::new("tok").with_expires_at(unix_now() + 10);
        assert!(t.is_expired());
    }

    #[test]
    fn test_bearer_header() {
        let t = AccessToken::new("t1").with_token_type("Bearer");
        assert_eq!(t.bearer_header(), "Bearer t1");
        assert_eq!(t.token_type(), Some("Bearer"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let t = AccessToken::new("super-secret-value");
        let dbg = format!("{t:?}");
        assert!(!dbg.contains("super-secret-value"), "leaked: {dbg}");
    }
}
