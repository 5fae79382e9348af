//! Opaque session credentials and the record a session binds to.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore as _;
use std::{fmt, sync::Arc};

use crate::AccessToken;

/// Random bytes per session id (256 bits).
const SESSION_ID_BYTES: usize = 32;
/// Length of the base64url (no padding) encoding of [`SESSION_ID_BYTES`].
const SESSION_ID_LEN: usize = 43;

/// The opaque value carried by the browser's session cookie.
///
/// It is meaningless on its own; only the session store can resolve it to a
/// token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh, unguessable session id.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Accept a cookie value only if it has the shape of an id we issued.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == SESSION_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        well_formed.then(|| Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The id is a bearer credential too; show only a prefix.
        let prefix = self.0.get(..6).unwrap_or("");
        write!(f, "SessionId({prefix}…)")
    }
}

/// A session's binding: the token plus bookkeeping timestamps (UNIX seconds).
#[derive(Debug, Clone)]
pub struct BoundSession {
    pub token: Arc<AccessToken>,
    pub created_at: u64,
    /// Hard expiry of the session itself, independent of the token's expiry.
    pub expires_at: Option<u64>,
}

impl BoundSession {
    /// Whether the session may still be used at `now`.
    ///
    /// `honor_token_expiry` additionally retires the session once the token
    /// reports itself expired.
    #[must_use]
    pub fn is_live_at(&self, now: u64, honor_token_expiry: bool) -> bool {
        if self.expires_at.is_some_and(|exp| now >= exp) {
            return false;
        }
        !(honor_token_expiry && self.token.is_expired_at(now))
    }

    /// Seconds since the binding was created.
    #[must_use]
    pub fn age_at(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_has_expected_shape() {
        let id = SessionId::generate();
        assert_eq!(id.as_str().len(), SESSION_ID_LEN);
        assert!(SessionId::parse(id.as_str()).is_some());
    }

    #[test]
    fn test_generate_different_each_call() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SessionId::parse("").is_none());
        assert!(SessionId::parse("short").is_none());
        assert!(SessionId::parse(&"a".repeat(SESSION_ID_LEN + 1)).is_none());
        let bad_char = format!("{}=", "a".repeat(SESSION_ID_LEN - 1));
        assert!(SessionId::parse(&bad_char).is_none());
    }

    #[test]
    fn test_debug_shows_prefix_only() {
        let id = SessionId::generate();
        let dbg = format!("{id:?}");
        assert!(!dbg.contains(id.as_str()));
    }

    #[test]
    fn test_is_live_respects_session_expiry() {
        let s = BoundSession {
            token: Arc::new(AccessToken::new("t")),
            created_at: 100,
            expires_at: Some(200),
        };
        assert!(s.is_live_at(150, true));
        assert!(!s.is_live_at(200, true));
    }

    #[test]
    fn test_is_live_token_expiry_optional() {
        let s = BoundSession {
            token: Arc::new(AccessToken::new("t").with_expires_at(1_000)),
            created_at: 0,
            expires_at: None,
        };
        assert!(!s.is_live_at(2_000, true));
        assert!(s.is_live_at(2_000, false));
    }

    #[test]
    fn test_age_never_negative() {
        let s = BoundSession {
            token: Arc::new(AccessToken::new("t")),
            created_at: 500,
            expires_at: None,
        };
        assert_eq!(s.age_at(530), 30);
        assert_eq!(s.age_at(400), 0);
    }
}
