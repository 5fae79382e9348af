//! Transparent forwarding of `GET /api/{*path}` to the Canvas API.
//!
//! Any upstream path is forwardable: the raw request path after `/api` is
//! appended to the configured base URL and the raw query string is echoed
//! verbatim. There is no allow-list. Because the forwarded path always
//! starts with `/`, the upstream host cannot be changed by the caller.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, Uri, header},
    response::Response,
};
use canvasgate_types::GateError;
use futures_util::TryStreamExt as _;
use std::sync::Arc;

use crate::{AppState, cookie, error::ApiError};

/// Mount point of the forwarder; stripped from the incoming path.
pub const API_PREFIX: &str = "/api";

/// Upstream response headers passed back to the browser. Everything else is dropped.
static RELAYED_HEADERS: [HeaderName; 3] = [
    header::CONTENT_TYPE,
    header::LINK,
    header::CONTENT_DISPOSITION,
];

/// One forwardable call, derived from the incoming URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    /// Upstream path, still percent-encoded, always starting with `/`.
    pub path: String,
    /// Raw query string, order and encoding untouched.
    pub query: Option<String>,
}

impl ProxyRequest {
    /// Split `uri` into the upstream path and query.
    #[must_use]
    pub fn from_uri(uri: &Uri) -> Self {
        let path = uri.path().strip_prefix(API_PREFIX).unwrap_or(uri.path());
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self {
            path,
            query: uri.query().filter(|q| !q.is_empty()).map(str::to_string),
        }
    }

    /// Full upstream URL under `base_url` (which must not end with `/`).
    #[must_use]
    pub fn upstream_url(&self, base_url: &str) -> String {
        match &self.query {
            Some(query) => format!("{base_url}{}?{query}", self.path),
            None => format!("{base_url}{}", self.path),
        }
    }
}

/// Forward the call with the session's bearer token and stream the answer back.
///
/// Without a live session the request is rejected before any upstream traffic.
pub async fn forward(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, ApiError> {
    let session = cookie::session_from_headers(&headers, &state.config.session.cookie_name);
    let token = match session {
        Some(id) => state.sessions.resolve(&id).await,
        None => None,
    };
    let Some(token) = token else {
        state.stats.record_unauthenticated();
        return Err(GateError::Unauthenticated.into());
    };

    let request = ProxyRequest::from_uri(&uri);
    let url = request.upstream_url(state.config.canvas.base_url());

    let upstream = state
        .http
        .get(&url)
        .header(header::AUTHORIZATION, token.bearer_header())
        .send()
        .await
        .map_err(|e| {
            state.stats.record_unavailable();
            tracing::warn!(path = %request.path, error = %e, "upstream request failed");
            GateError::UpstreamUnavailable(format!(
                "could not reach upstream: {}",
                e.without_url()
            ))
        })?;

    let status = upstream.status();
    state.stats.record_relayed(status);
    tracing::debug!(path = %request.path, status = status.as_u16(), "relaying upstream response");

    relay(upstream)
}

/// Copy status and the relayed headers, and stream the body without buffering.
///
/// Dropping the returned body (client disconnect) drops the upstream stream,
/// which releases the connection.
fn relay(upstream: reqwest::Response) -> Result<Response, ApiError> {
    let mut builder = Response::builder().status(upstream.status());
    for name in &RELAYED_HEADERS {
        if let Some(value) = upstream.headers().get(name) {
            builder = builder.header(name, value.clone());
        }
    }

    let stream = upstream.bytes_stream().map_err(std::io::Error::other);
    builder
        .body(Body::from_stream(stream))
        .map_err(|e| {
            ApiError(GateError::UpstreamUnavailable(format!(
                "unrelayable upstream response: {e}"
            )))
        })
}
