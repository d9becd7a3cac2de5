//! CLI command implementations

use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::api;
use crate::auth;
use crate::cli::{error, info, print_claims, print_route_table, success, warn, OutputFormat};
use crate::config::{self, loader::CONFIG_FILENAME, Config};
use crate::guard::{RouteClass, RoutePolicy};

/// How the guard treats one path
#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    pub path: String,
    /// Static asset that never reaches the guard
    pub excluded: bool,
    pub class: Option<RouteClass>,
    /// Outcome for a visitor without a session
    pub anonymous: String,
}

impl RouteReport {
    pub fn new(policy: &RoutePolicy, path: &str) -> Self {
        if policy.is_excluded(path) {
            return Self {
                path: path.to_string(),
                excluded: true,
                class: None,
                anonymous: "served directly".to_string(),
            };
        }

        let class = policy.classify(path);
        let anonymous = match class {
            RouteClass::Public => "pass-through".to_string(),
            RouteClass::Protected => format!("redirect to {}", policy.login_path()),
        };
        Self {
            path: path.to_string(),
            excluded: false,
            class: Some(class),
            anonymous,
        }
    }
}

/// Initialize a new schoolgate.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = Path::new(CONFIG_FILENAME);

    if config_path.exists() {
        warn(&format!("{} already exists", CONFIG_FILENAME));
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success(&format!("Created {}", CONFIG_FILENAME));
    info("Set SCHOOLGATE_AUTH_URL and SCHOOLGATE_ANON_KEY, then run 'schoolgate serve'");

    Ok(())
}

/// Start the gateway
pub async fn serve(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config(config_path)?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    if config.auth.anon_key.is_empty() {
        warn("auth.anon_key is empty; the auth service will likely reject requests");
    }

    info(&format!("Starting gateway on {}:{}", host, port));
    match api::run_server(config, &host, port).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error(&format!("Gateway stopped: {}", e));
            Err(e.into())
        }
    }
}

/// Show how the guard treats each path
pub async fn routes(config_path: Option<&Path>, paths: &[String], format: OutputFormat) -> Result<()> {
    let config = load_config(config_path)?;
    let policy = RoutePolicy::from_config(&config.guard)?;
    let reports: Vec<RouteReport> = paths.iter().map(|p| RouteReport::new(&policy, p)).collect();

    match format {
        OutputFormat::Table => print_route_table(&reports),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&reports)?),
    }

    Ok(())
}

/// Decode an access token without verifying it
pub async fn token(token: &str, format: OutputFormat) -> Result<()> {
    let claims = auth::peek_claims(token)?;

    match format {
        OutputFormat::Table => print_claims(&claims),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&claims)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&claims)?),
    }

    Ok(())
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => config::load_config_from_path(path)?,
        None => config::load_config()?,
    };
    Ok(config)
}
