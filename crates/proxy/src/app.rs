//! Bootstrap page and small service routes.

use axum::{
    Json,
    extract::State,
    response::{Html, Response},
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::{AppState, oauth::found, stats::StatsSnapshot};

/// Minimal page that talks to the LMS only through `/api/*`. The browser never
/// sees the access token; its session cookie is sent automatically.
const BOOTSTRAP_HTML: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Canvas Gateway</title>
  </head>
  <body>
    <h2>Canvas Gateway</h2>
    <p>
      <a href="/login">Log in with Canvas</a> |
      <a href="/logout">Log out</a>
    </p>
    <button id="load">Load Courses</button>
    <pre id="output"></pre>
    <script>
      document.getElementById('load').addEventListener('click', async () => {
        const out = document.getElementById('output');
        const res = await fetch('/api/api/v1/courses?enrollment_state=active&per_page=100');
        if (res.status === 401) {
          out.textContent = 'Not logged in.';
          return;
        }
        const type = res.headers.get('content-type') || '';
        out.textContent = type.includes('json')
          ? JSON.stringify(await res.json(), null, 2)
          : await res.text();
      });
    </script>
  </body>
</html>
"#;

/// `GET <app_path>`
pub async fn app_page() -> Html<&'static str> {
    Html(BOOTSTRAP_HTML)
}

/// `GET /` redirects to the app entry.
pub async fn root_redirect(State(state): State<Arc<AppState>>) -> Response {
    found(state.app_location.clone())
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "service": "canvasgate"}))
}

/// `GET /stats`
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    let active = state.sessions.active_sessions().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not count sessions");
        0
    });
    Json(state.stats.snapshot(active))
}
