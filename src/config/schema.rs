//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub guard: GuardConfig,
}

/// Server configuration for the gateway listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// The website that pass-through requests are forwarded to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_upstream_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Hosted auth service connection and session cookie settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the hosted backend, e.g. https://project.example.co
    #[serde(default = "default_auth_url")]
    pub url: String,

    /// Public API key sent as the `apikey` header
    #[serde(default)]
    pub anon_key: String,

    #[serde(default = "default_access_cookie")]
    pub access_cookie: String,

    #[serde(default = "default_refresh_cookie")]
    pub refresh_cookie: String,

    /// When set, access tokens are verified locally instead of asking the backend
    #[serde(default)]
    pub jwt_secret: Option<String>,

    #[serde(default = "default_jwt_audience")]
    pub jwt_audience: Option<String>,

    /// Refresh the session when the access token expires within this many seconds
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: i64,

    #[serde(default = "default_auth_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub cookie: SessionCookieConfig,
}

fn default_auth_url() -> String {
    "http://127.0.0.1:54321".to_string()
}

fn default_access_cookie() -> String {
    "sb-access-token".to_string()
}

fn default_refresh_cookie() -> String {
    "sb-refresh-token".to_string()
}

fn default_jwt_audience() -> Option<String> {
    Some("authenticated".to_string())
}

fn default_refresh_margin_secs() -> i64 {
    10
}

fn default_auth_timeout_secs() -> u64 {
    10
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            url: default_auth_url(),
            anon_key: String::new(),
            access_cookie: default_access_cookie(),
            refresh_cookie: default_refresh_cookie(),
            jwt_secret: None,
            jwt_audience: default_jwt_audience(),
            refresh_margin_secs: default_refresh_margin_secs(),
            timeout_secs: default_auth_timeout_secs(),
            cookie: SessionCookieConfig::default(),
        }
    }
}

/// Attributes applied to session cookies written after a token refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCookieConfig {
    #[serde(default = "default_cookie_path")]
    pub path: String,

    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default)]
    pub secure: bool,

    #[serde(default)]
    pub http_only: bool,

    #[serde(default = "default_same_site")]
    pub same_site: String,

    /// 400 days, the longest lifetime browsers accept
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: i64,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_same_site() -> String {
    "lax".to_string()
}

fn default_max_age_secs() -> i64 {
    400 * 24 * 60 * 60
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self {
            path: default_cookie_path(),
            domain: None,
            secure: false,
            http_only: false,
            same_site: default_same_site(),
            max_age_secs: default_max_age_secs(),
        }
    }
}

/// Route guard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default = "default_protected_prefix")]
    pub protected_prefix: String,

    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Paths under the protected prefix that stay public
    #[serde(default)]
    pub exempt_paths: Vec<String>,

    /// Regex patterns for static assets that bypass the guard entirely
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_protected_prefix() -> String {
    "/admin".to_string()
}

fn default_login_path() -> String {
    "/admin/login".to_string()
}

fn default_exclude() -> Vec<String> {
    vec![
        r"^/_next/static/".to_string(),
        r"^/_next/image".to_string(),
        r"^/favicon\.ico$".to_string(),
        r"\.(?:svg|png|jpg|jpeg|gif|webp)$".to_string(),
    ]
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            protected_prefix: default_protected_prefix(),
            login_path: default_login_path(),
            exempt_paths: Vec::new(),
            exclude: default_exclude(),
        }
    }
}

impl Config {
    /// Address the gateway binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
