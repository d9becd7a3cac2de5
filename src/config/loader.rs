//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

pub const CONFIG_FILENAME: &str = "schoolgate.toml";

/// Load configuration from schoolgate.toml
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    load_config_from_path(&config_path)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    parse_config(&content)
}

/// Parse configuration text after interpolating environment variables
pub fn parse_config(content: &str) -> Result<Config> {
    let content = interpolate_env_vars(content);
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    // Compile-time constant pattern; a failure here is a bug in the codebase
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# Schoolgate Configuration

[server]
host = "0.0.0.0"
port = 8080

# The school website that allowed requests are forwarded to
[upstream]
url = "${SCHOOLGATE_UPSTREAM:-http://127.0.0.1:3000}"
timeout_secs = 30

# Hosted auth service
[auth]
url = "${SCHOOLGATE_AUTH_URL:-http://127.0.0.1:54321}"
anon_key = "${SCHOOLGATE_ANON_KEY}"
access_cookie = "sb-access-token"
refresh_cookie = "sb-refresh-token"
refresh_margin_secs = 10
timeout_secs = 10
# Verify access tokens locally instead of calling the user endpoint
# jwt_secret = "${SCHOOLGATE_JWT_SECRET}"
# jwt_audience = "authenticated"

[auth.cookie]
path = "/"
secure = true
http_only = false
same_site = "lax"
max_age_secs = 34560000

[guard]
protected_prefix = "/admin"
login_path = "/admin/login"
# Without this the login page itself redirects to the login page
exempt_paths = ["/admin/login"]
exclude = [
    "^/_next/static/",
    "^/_next/image",
    "^/favicon\\.ico$",
    "\\.(?:svg|png|jpg|jpeg|gif|webp)$",
]
"#
}
