//! OAuth route handlers: login redirect, callback, logout.
//!
//! Routes:
//! - `GET /login`          -> 302 to the Canvas authorize endpoint.
//! - `GET /oauth/callback` -> exchange the code, set the session cookie, 302 to the app.
//! - `GET /logout`         -> clear the session and cookie, 302 to the app.
use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use canvasgate_types::GateError;
use serde::Deserialize;
use std::sync::Arc;

use crate::{AppState, cookie, error::ApiError};

/// `302 Found` to `location`.
pub(crate) fn found(location: HeaderValue) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Begin the flow. The target URL is fixed at startup from configuration.
pub async fn login(State(state): State<Arc<AppState>>) -> Response {
    found(state.authorize_location.clone())
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    /// OAuth error code sent instead of `code` when the user denies access.
    pub error: Option<String>,
}

/// Complete the flow: exchange the code once and bind the token to a new session.
///
/// A missing code is rejected before any upstream traffic.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        let err = match query.error.as_deref() {
            Some(reason) => GateError::AuthorizationDenied(oauth_error_code(reason).to_string()),
            None => GateError::MissingCode,
        };
        tracing::info!(error = %err, "callback rejected");
        return Err(err.into());
    };

    let token = match state.exchanger.exchange(code).await {
        Ok(token) => token,
        Err(e) => {
            state.stats.record_exchange_failure();
            tracing::warn!(error = %e, "authorization code exchange failed");
            return Err(e.into());
        }
    };

    // A browser logging in again must not leave its previous binding behind.
    if let Some(previous) = cookie::session_from_headers(&headers, &state.config.session.cookie_name)
    {
        state.sessions.clear(&previous).await?;
    }

    let id = state.sessions.bind(token).await?;
    state.stats.record_login();

    let set_cookie = HeaderValue::from_str(&cookie::build_session_cookie(
        &id,
        &state.config.session,
    ))
    .map_err(|e| GateError::Config(format!("invalid session cookie: {e}")))?;

    let mut response = found(state.app_location.clone());
    response.headers_mut().append(header::SET_COOKIE, set_cookie);
    Ok(response)
}

/// End the session. Idempotent: a browser without a session is just redirected.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(id) = cookie::session_from_headers(&headers, &state.config.session.cookie_name)
        && let Some(token) = state.sessions.clear(&id).await?
        && state.config.session.revoke_on_logout
        && let Err(e) = state.exchanger.revoke(&token).await
    {
        tracing::warn!(error = %e, "token revocation failed");
    }

    let clear = HeaderValue::from_str(&cookie::build_clear_session_cookie(&state.config.session))
        .map_err(|e| GateError::Config(format!("invalid session cookie: {e}")))?;
    let mut response = found(state.app_location.clone());
    response.headers_mut().append(header::SET_COOKIE, clear);
    Ok(response)
}

/// Echo the OAuth `error` parameter only when it looks like an RFC 6749 error code.
fn oauth_error_code(raw: &str) -> &str {
    if !raw.is_empty() && raw.len() <= 64 && raw.bytes().all(|b| b.is_ascii_lowercase() || b == b'_')
    {
        raw
    } else {
        "unknown_error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oauth_error_code_passthrough() {
        assert_eq!(oauth_error_code("access_denied"), "access_denied");
    }

    #[test]
    fn test_oauth_error_code_sanitized() {
        assert_eq!(oauth_error_code("<script>"), "unknown_error");
        assert_eq!(oauth_error_code(""), "unknown_error");
        assert_eq!(oauth_error_code(&"a".repeat(65)), "unknown_error");
    }
}
