//! Session cookie helpers.
//!
//! The session cookie is always `HttpOnly` so page script can never read it,
//! and `SameSite=Lax` so it still rides along on the top-level redirect back
//! from the authorization server.

use axum::http::{HeaderMap, header};
use canvasgate_config::SessionConfig;
use canvasgate_types::SessionId;
use std::fmt::Write as _;

/// Build a `Set-Cookie` header value binding the browser to `id`.
///
/// Without `max_age_secs` the cookie has no `Max-Age`, i.e. it lives for the
/// browser session.
#[must_use]
pub fn build_session_cookie(id: &SessionId, config: &SessionConfig) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        config.cookie_name,
        id.as_str()
    );
    if let Some(max_age) = config.max_age_secs {
        let _ = write!(cookie, "; Max-Age={max_age}");
    }
    push_common(&mut cookie, config);
    cookie
}

/// Build a `Set-Cookie` header value that clears the session cookie.
#[must_use]
pub fn build_clear_session_cookie(config: &SessionConfig) -> String {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        config.cookie_name
    );
    push_common(&mut cookie, config);
    cookie
}

fn push_common(cookie: &mut String, config: &SessionConfig) {
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    if let Some(domain) = &config.cookie_domain {
        let _ = write!(cookie, "; Domain={domain}");
    }
}

/// Read the session id from the request's `Cookie` headers.
///
/// Values that do not look like an id we issued are ignored.
#[must_use]
pub fn session_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == cookie_name)
        .find_map(|(_, value)| SessionId::parse(value.trim_matches('"')))
}
