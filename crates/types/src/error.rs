//! Unified error type for the canvasgate workspace.

use thiserror::Error;

/// Enumerates all error kinds that can occur across canvasgate crates.
///
/// Messages are safe to show to a browser: no variant ever carries an access
/// token, an authorization code or the client secret.
#[derive(Debug, Error)]
pub enum GateError {
    /// Missing or invalid startup configuration. Fatal.
    #[error("configuration error: {0}")]
    Config(String),

    /// The OAuth callback arrived without an authorization code.
    #[error("missing authorization code")]
    MissingCode,

    /// The authorization server redirected back with an OAuth `error` instead of a code.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The token endpoint was reachable but produced no usable access token.
    #[error("token exchange failed: {0}")]
    AuthExchange(String),

    /// No bound session for the request.
    #[error("not logged in")]
    Unauthenticated,

    /// Transport-level failure talking to the upstream server.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Session storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ── Feature-gated From impls ──────────────────────────────────────────────────

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for GateError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest includes the request URL in its Display; the URL never
        // carries a credential here, so it stays as context.
        Self::UpstreamUnavailable(e.to_string())
    }
}

impl GateError {
    /// Returns `true` if the error concerns the caller's credentials rather than
    /// the gateway or the upstream transport.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingCode
                | Self::AuthorizationDenied(_)
                | Self::AuthExchange(_)
                | Self::Unauthenticated
        )
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, GateError>;
