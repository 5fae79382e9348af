//! Shared harness: a stub Canvas instance on an ephemeral port and a gateway
//! router pointed at it.

#![allow(dead_code)]

use axum::{
    Form, Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use canvasgate_auth::SessionManager;
use canvasgate_config::Config;
use canvasgate_proxy::{AppState, make_router};
use canvasgate_store::InMemorySessionStore;
use futures_util::stream;
use serde::Deserialize;
use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};
use tower::ServiceExt as _;

/// What the stub API answers with for every `GET /api/...`.
#[derive(Clone)]
pub struct Canned {
    pub status: StatusCode,
    pub content_type: Option<&'static str>,
    pub body: &'static str,
    pub link: Option<&'static str>,
    /// Serve an endless chunked body instead of `body`.
    pub endless: bool,
}

impl Default for Canned {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            content_type: Some("application/json"),
            body: r#"[{"id":1,"name":"Biology 101"}]"#,
            link: None,
            endless: false,
        }
    }
}

#[derive(Default)]
pub struct Upstream {
    pub token_calls: AtomicUsize,
    pub api_calls: AtomicUsize,
    used_codes: Mutex<HashSet<String>>,
    /// `Authorization` header of each API call, in order.
    pub authorizations: Mutex<Vec<Option<String>>>,
    /// Path and query of each API call, in order.
    pub requested: Mutex<Vec<String>>,
    /// `Authorization` header of each revocation call.
    pub revocations: Mutex<Vec<String>>,
    /// Set once an endless body has been dropped by the server.
    pub stream_dropped: Arc<AtomicBool>,
    canned: Mutex<Canned>,
}

impl Upstream {
    pub fn set_response(&self, canned: Canned) {
        *self.canned.lock().unwrap() = canned;
    }

    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::SeqCst)
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn revocations(&self) -> Vec<String> {
        self.revocations.lock().unwrap().clone()
    }

    /// Wait up to five seconds for the endless body to be released.
    pub async fn wait_stream_dropped(&self) -> bool {
        for _ in 0..50 {
            if self.stream_dropped.load(Ordering::SeqCst) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        false
    }
}

/// Flags the stub when the body stream holding it is dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[derive(Deserialize)]
struct TokenForm {
    grant_type: String,
    code: String,
}

/// Token endpoint: each code is good once and yields `t-<code>`.
async fn token(State(up): State<Arc<Upstream>>, Form(form): Form<TokenForm>) -> Response {
    up.token_calls.fetch_add(1, Ordering::SeqCst);
    if form.grant_type != "authorization_code" {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "unsupported_grant_type"})),
        )
            .into_response();
    }
    if !up.used_codes.lock().unwrap().insert(form.code.clone()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "invalid_grant"})),
        )
            .into_response();
    }
    Json(serde_json::json!({
        "access_token": format!("t-{}", form.code),
        "token_type": "Bearer",
        "expires_in": 3600
    }))
    .into_response()
}

async fn revoke(State(up): State<Arc<Upstream>>, headers: HeaderMap) -> StatusCode {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    up.revocations.lock().unwrap().push(auth);
    StatusCode::OK
}

async fn api(State(up): State<Arc<Upstream>>, headers: HeaderMap, uri: Uri) -> Response {
    up.api_calls.fetch_add(1, Ordering::SeqCst);
    up.authorizations.lock().unwrap().push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
    up.requested.lock().unwrap().push(
        uri.path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default(),
    );
    let canned = up.canned.lock().unwrap().clone();
    let mut builder = Response::builder()
        .status(canned.status)
        .header("x-request-cost", "0.5");
    if let Some(content_type) = canned.content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    if let Some(link) = canned.link {
        builder = builder.header(header::LINK, link);
    }
    if canned.endless {
        let guard = DropFlag(Arc::clone(&up.stream_dropped));
        let chunks = stream::unfold(guard, |guard| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Some((Ok::<_, std::io::Error>(vec![b'x'; 1024]), guard))
        });
        return builder.body(Body::from_stream(chunks)).unwrap();
    }
    builder.body(Body::from(canned.body)).unwrap()
}

/// Start the stub and return its base URL.
pub async fn spawn_upstream() -> (String, Arc<Upstream>) {
    let upstream = Arc::new(Upstream::default());
    let app = Router::new()
        .route("/login/oauth2/token", post(token).delete(revoke))
        .route("/api/{*rest}", get(api))
        .with_state(Arc::clone(&upstream));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    (format!("http://{addr}"), upstream)
}

/// Base URL of a port nothing listens on.
pub async fn dead_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.canvas.url = base_url.to_string();
    config.canvas.client_id = Some("abc".into());
    config.canvas.client_secret = Some("shh".into());
    config
}

pub fn gateway(config: Config) -> (Router, Arc<AppState>) {
    let sessions = Arc::new(SessionManager::new(
        Arc::new(InMemorySessionStore::new()),
        &config.session,
    ));
    let state = AppState::new(config, sessions).unwrap();
    (make_router(Arc::clone(&state)), state)
}

pub async fn send(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut req = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_string(resp: Response) -> String {
    use http_body_util::BodyExt as _;
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn set_cookie(resp: &Response) -> String {
    resp.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string()
}

/// `name=value` part of a `Set-Cookie` value, as a browser would send it back.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

/// Run the callback with `code` and return the cookie to send on later requests.
pub async fn login(app: &Router, code: &str) -> String {
    let resp = send(app, &format!("/oauth/callback?code={code}"), None).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    cookie_pair(&set_cookie(&resp))
}
