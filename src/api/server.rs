//! HTTP gateway server

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthBackend, HostedAuthClient};
use crate::config::Config;
use crate::error::Result;
use crate::guard::{session_guard, RoutePolicy};

use super::{proxy, routes};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub policy: Arc<RoutePolicy>,
    pub backend: Arc<dyn AuthBackend>,
    /// Client used to forward requests upstream
    pub http: reqwest::Client,
}

impl AppState {
    /// Build state backed by the hosted auth service from `config`
    pub fn from_config(config: Config) -> Result<Self> {
        let backend = HostedAuthClient::new(config.auth.clone())?;
        Self::with_backend(config, Arc::new(backend))
    }

    /// Build state around any auth backend
    pub fn with_backend(config: Config, backend: Arc<dyn AuthBackend>) -> Result<Self> {
        let policy = RoutePolicy::from_config(&config.guard)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            policy: Arc::new(policy),
            backend,
            http,
        })
    }
}

/// Run the gateway
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    let upstream = config.upstream.url.clone();
    let state = AppState::from_config(config)?;

    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Gateway listening on {}, forwarding to {}", addr, upstream);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::health))
        // Everything else belongs to the website
        .fallback(proxy::forward)
        // Middleware
        .layer(middleware::from_fn_with_state(state.clone(), session_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
