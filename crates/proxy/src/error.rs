//! API error type that maps [`GateError`] variants to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use canvasgate_types::GateError;
use serde_json::json;

/// Wrapper around [`GateError`] that implements [`IntoResponse`].
///
/// Only gateway-originated failures pass through here. Upstream non-2xx
/// responses are relayed verbatim by the forwarder and never become an
/// `ApiError`.
pub struct ApiError(pub GateError);

impl ApiError {
    /// Returns `(status, error_type, error_code)` for the wrapped error.
    fn classify(&self) -> (StatusCode, &'static str, &'static str) {
        match &self.0 {
            GateError::MissingCode => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "missing_code",
            ),
            GateError::AuthorizationDenied(_) => (
                StatusCode::BAD_REQUEST,
                "authentication_error",
                "authorization_denied",
            ),
            GateError::AuthExchange(_) => (
                StatusCode::BAD_REQUEST,
                "authentication_error",
                "exchange_failed",
            ),
            GateError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "not_logged_in",
            ),
            GateError::UpstreamUnavailable(_) => (
                StatusCode::BAD_GATEWAY,
                "server_error",
                "upstream_unavailable",
            ),
            GateError::Config(_) | GateError::Storage(_) | GateError::Serialization(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "internal_error",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, error_code) = self.classify();
        let msg = self.0.to_string();
        (
            status,
            Json(json!({
                "error": {
                    "message": msg,
                    "type": error_type,
                    "code": error_code,
                }
            })),
        )
            .into_response()
    }
}

impl From<GateError> for ApiError {
    fn from(e: GateError) -> Self {
        Self(e)
    }
}
