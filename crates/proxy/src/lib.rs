//! HTTP layer — axum router, route handlers, and error mapping.
//!
//! Exposes the OAuth entry/callback/logout routes, the transparent
//! `/api/{*path}` forwarder to the Canvas API, and a minimal bootstrap page.

mod app;
pub mod cookie;
mod error;
pub mod forward;
mod oauth;
pub mod stats;

pub use error::ApiError;
pub use forward::ProxyRequest;
pub use stats::RelayStats;

use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    routing::get,
};
use canvasgate_auth::{SessionManager, TokenExchanger, canvas};
use canvasgate_config::{Config, UpstreamConfig};
use canvasgate_types::GateError;
use std::{sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;

/// Shared application state passed to all route handlers.
pub struct AppState {
    /// Validated configuration; fixed for the life of the process.
    pub config: Arc<Config>,
    /// Session binder shared by the callback, logout and forwarder.
    pub sessions: Arc<SessionManager>,
    /// Authorization-code exchanger.
    pub exchanger: TokenExchanger,
    /// HTTP client for forwarded upstream requests.
    pub http: reqwest::Client,
    /// In-memory relay counters.
    pub stats: Arc<RelayStats>,
    /// `Location` for `/login`, built once from configuration.
    authorize_location: HeaderValue,
    /// `Location` of the app entry route.
    app_location: HeaderValue,
}

impl AppState {
    /// Creates the shared state, failing fast on any configuration problem.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: Config, sessions: Arc<SessionManager>) -> Result<Arc<Self>, GateError> {
        config.validate()?;
        let http = build_http_client(&config.upstream)?;
        let exchanger = TokenExchanger::from_config(&config.canvas, http.clone())?;
        let authorize_location = header_value(&canvas::build_auth_url(&config.canvas)?)?;
        let app_location = header_value(&config.app_path)?;
        Ok(Arc::new(Self {
            config: Arc::new(config),
            sessions,
            exchanger,
            http,
            stats: Arc::new(RelayStats::new()),
            authorize_location,
            app_location,
        }))
    }
}

fn header_value(value: &str) -> Result<HeaderValue, GateError> {
    HeaderValue::from_str(value)
        .map_err(|e| GateError::Config(format!("{value:?} is not a valid header value: {e}")))
}

/// Build the upstream HTTP client.
///
/// Only a connect timeout is set: proxied bodies are streamed and may
/// legitimately take long. Redirects are followed; reqwest drops the
/// `Authorization` header when a redirect leaves the upstream host.
fn build_http_client(upstream: &UpstreamConfig) -> Result<reqwest::Client, GateError> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(upstream.connect_timeout_secs))
        .user_agent(concat!("canvasgate/", env!("CARGO_PKG_VERSION")));
    if let Some(url) = upstream.proxy_url.as_deref() {
        let proxy = reqwest::Proxy::all(url)
            .map_err(|e| GateError::Config(format!("invalid upstream.proxy_url: {e}")))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| GateError::Config(format!("failed to build HTTP client: {e}")))
}

/// Build the full axum router.
///
/// Routes:
/// - GET /                 -> redirect to the app entry
/// - GET /login            -> redirect to the Canvas authorize endpoint
/// - GET /oauth/callback   -> exchange code, set session cookie
/// - GET /logout           -> clear session
/// - GET /api/{*path}      -> forwarded to the Canvas instance with the session token
/// - GET <app_path>        -> bootstrap page
/// - GET /health
/// - GET /stats
pub fn make_router(state: Arc<AppState>) -> Router {
    let app_path = state.config.app_path.clone();
    Router::new()
        .route("/", get(app::root_redirect))
        .route("/login", get(oauth::login))
        .route("/oauth/callback", get(oauth::callback))
        .route("/logout", get(oauth::logout))
        .route("/api/{*path}", get(forward::forward))
        .route(&app_path, get(app::app_page))
        .route("/health", get(app::health))
        .route("/stats", get(app::stats))
        .with_state(state)
        // Path only: the callback query carries the authorization code.
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            tracing::info_span!("request", method = %req.method(), path = %req.uri().path())
        }))
}
