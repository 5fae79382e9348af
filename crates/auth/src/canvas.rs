//! Canvas OAuth 2.0 authorization-code flow: URL building, token request
//! parameters and response parsing.
//!
//! Endpoints are relative to the configured instance:
//! `/login/oauth2/auth` for the browser redirect and `/login/oauth2/token`
//! for the code exchange and revocation.

use canvasgate_config::CanvasConfig;
use canvasgate_types::{AccessToken, GateError, Result};
use serde_json::Value;

/// Build the authorization URL the browser is redirected to.
///
/// Only configuration flows into the URL; every component is percent-encoded.
///
/// # Errors
///
/// Returns [`GateError::Config`] if no client id is configured.
pub fn build_auth_url(canvas: &CanvasConfig) -> Result<String> {
    let client_id = canvas
        .client_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| GateError::Config("canvas.client_id is required".into()))?;

    let mut url = format!(
        "{}?client_id={}&response_type=code&redirect_uri={}",
        canvas.authorize_url(),
        urlencoding::encode(client_id),
        urlencoding::encode(&canvas.redirect_uri),
    );
    if let Some(scope) = canvas.scope.as_deref().filter(|s| !s.is_empty()) {
        url.push_str("&scope=");
        url.push_str(&urlencoding::encode(scope));
    }
    Ok(url)
}

/// Form fields for the `authorization_code` grant.
#[must_use]
pub fn token_form_params<'a>(
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    code: &'a str,
) -> [(&'static str, &'a str); 5] {
    [
        ("grant_type", "authorization_code"),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("redirect_uri", redirect_uri),
        ("code", code),
    ]
}

/// Parse the token endpoint response into an [`AccessToken`].
///
/// A reachable endpoint that yields no usable `access_token` is an
/// authentication failure whatever its HTTP status; the message names the
/// status and the OAuth `error` code but never echoes the body.
///
/// # Errors
///
/// Returns [`GateError::AuthExchange`] if the body is not JSON or lacks a
/// non-empty `access_token`.
pub fn parse_token_response(status: u16, body: &[u8]) -> Result<AccessToken> {
    let json: Value = serde_json::from_slice(body).map_err(|_| {
        GateError::AuthExchange(format!(
            "token endpoint returned status {status} with a non-JSON body"
        ))
    })?;

    let Some(access_token) = json
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
    else {
        let reason = json
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("missing access_token");
        return Err(GateError::AuthExchange(format!(
            "token endpoint returned status {status}: {reason}"
        )));
    };

    let mut token = AccessToken::new(access_token);
    if let Some(token_type) = json.get("token_type").and_then(Value::as_str) {
        token = token.with_token_type(token_type);
    }
    if let Some(expires_in) = json.get("expires_in").and_then(Value::as_u64) {
        token = token.with_expiry(expires_in);
    }
    Ok(token)
}
