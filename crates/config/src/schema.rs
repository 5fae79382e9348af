use canvasgate_types::GateError;
use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path};

fn default_true() -> bool {
    true
}

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_app_path() -> String {
    "/app".to_string()
}

fn default_canvas_url() -> String {
    "https://canvas.instructure.com".to_string()
}
fn default_redirect_uri() -> String {
    "http://localhost:3000/oauth/callback".to_string()
}

// Canvas developer-key ids are all digits; figment parses such env values as
// integers, so accept either form.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Unsigned(u64),
    Signed(i64),
}

fn lenient_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(de)?.map(|v| match v {
        StringOrNumber::String(s) => s,
        StringOrNumber::Unsigned(n) => n.to_string(),
        StringOrNumber::Signed(n) => n.to_string(),
    }))
}

/// Upstream Canvas instance and the registered OAuth client.
#[derive(Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Base URL of the Canvas instance; also the base for proxied API paths.
    #[serde(default = "default_canvas_url")]
    pub url: String,
    /// OAuth client (developer key) id. Required.
    #[serde(default, deserialize_with = "lenient_string")]
    pub client_id: Option<String>,
    /// OAuth client secret. Required.
    #[serde(default, deserialize_with = "lenient_string")]
    pub client_secret: Option<String>,
    /// Redirect URI registered for the developer key.
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// Space-delimited scope list; omitted from the authorize URL when unset.
    #[serde(default)]
    pub scope: Option<String>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            url: default_canvas_url(),
            client_id: None,
            client_secret: None,
            redirect_uri: default_redirect_uri(),
            scope: None,
        }
    }
}

impl fmt::Debug for CanvasConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasConfig")
            .field("url", &self.url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .finish()
    }
}

impl CanvasConfig {
    /// Authorization endpoint derived from the base URL.
    #[must_use]
    pub fn authorize_url(&self) -> String {
        format!("{}/login/oauth2/auth", self.base_url())
    }

    /// Token endpoint derived from the base URL.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/login/oauth2/token", self.base_url())
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

fn default_cookie_name() -> String {
    "canvas_session".to_string()
}
fn default_sweep_interval() -> u64 {
    300
}

/// Session cookie and lifetime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the HTTP-only session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Add the `Secure` attribute (enable behind HTTPS).
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default)]
    pub cookie_domain: Option<String>,
    /// Session lifetime. `None` keeps a browser-session cookie with no server-side TTL.
    #[serde(default)]
    pub max_age_secs: Option<u64>,
    /// Retire a session once the upstream-reported token expiry passes.
    #[serde(default = "default_true")]
    pub honor_token_expiry: bool,
    /// Revoke the upstream token on logout (best effort).
    #[serde(default)]
    pub revoke_on_logout: bool,
    /// How often expired sessions are swept from the store.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_secure: false,
            cookie_domain: None,
            max_age_secs: None,
            honor_token_expiry: true,
            revoke_on_logout: false,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    10
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Optional outbound proxy for all upstream traffic.
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            proxy_url: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Logging configuration. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listen port (defaults to 3000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Listen address (defaults to `127.0.0.1`).
    #[serde(default = "default_host")]
    pub host: String,
    /// Route the browser lands on after login.
    #[serde(default = "default_app_path")]
    pub app_path: String,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            app_path: default_app_path(),
            canvas: CanvasConfig::default(),
            session: SessionConfig::default(),
            upstream: UpstreamConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// `CANVAS_URL` → `canvas.url`, `CANVAS_CLIENT_ID` → `canvas.client_id`, ...
fn canvas_env() -> Env {
    Env::prefixed("CANVAS_").map(|key| format!("canvas.{key}").into())
}

/// `CANVASGATE_PORT` → `port`, `CANVASGATE_SESSION__COOKIE_SECURE` → `session.cookie_secure`.
fn gateway_env() -> Env {
    Env::prefixed("CANVASGATE_").split("__")
}

impl Config {
    /// Parses configuration from a YAML string, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML is invalid or extraction fails.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::string(yaml))
            .extract()
    }

    /// Loads configuration from a file path, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be read or parsed.
    #[allow(clippy::result_large_err)]
    pub fn from_file(path: &Path) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .extract()
    }

    /// Loads defaults, then the optional YAML file, then the environment.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file or an environment value cannot be parsed.
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(canvas_env()).merge(gateway_env()).extract()
    }

    /// Checks everything the gateway needs before it accepts a request.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] naming the first problem found.
    pub fn validate(&self) -> Result<(), GateError> {
        if self.canvas.client_id.as_deref().is_none_or(str::is_empty) {
            return Err(GateError::Config(
                "canvas.client_id is required (set CANVAS_CLIENT_ID)".into(),
            ));
        }
        if self
            .canvas
            .client_secret
            .as_deref()
            .is_none_or(str::is_empty)
        {
            return Err(GateError::Config(
                "canvas.client_secret is required (set CANVAS_CLIENT_SECRET)".into(),
            ));
        }
        check_http_url("canvas.url", &self.canvas.url)?;
        check_http_url("canvas.redirect_uri", &self.canvas.redirect_uri)?;
        if !is_cookie_token(&self.session.cookie_name) {
            return Err(GateError::Config(format!(
                "session.cookie_name {:?} is not a valid cookie name",
                self.session.cookie_name
            )));
        }
        if let Some(domain) = &self.session.cookie_domain
            && !is_cookie_domain(domain)
        {
            return Err(GateError::Config(format!(
                "session.cookie_domain {domain:?} is not a valid domain"
            )));
        }
        if !self.app_path.starts_with('/') {
            return Err(GateError::Config(format!(
                "app_path {:?} must start with '/'",
                self.app_path
            )));
        }
        if is_reserved_path(&self.app_path) {
            return Err(GateError::Config(format!(
                "app_path {:?} collides with a built-in route",
                self.app_path
            )));
        }
        if self.app_path.contains(['{', '}', '*', '?', '#']) {
            return Err(GateError::Config(format!(
                "app_path {:?} must be a plain path",
                self.app_path
            )));
        }
        Ok(())
    }
}

const RESERVED_PATHS: [&str; 6] = ["/", "/login", "/logout", "/oauth/callback", "/health", "/stats"];

fn is_reserved_path(path: &str) -> bool {
    RESERVED_PATHS.contains(&path) || path == "/api" || path.starts_with("/api/")
}

fn check_http_url(key: &str, value: &str) -> Result<(), GateError> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(GateError::Config(format!(
            "{key} must be an absolute http(s) URL, got {value:?}"
        ))),
    }
}

// Host name, optionally with a leading dot; nothing that could end the attribute.
fn is_cookie_domain(domain: &str) -> bool {
    !domain.is_empty()
        && domain
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
}

// RFC 6265 cookie-name token characters.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}
