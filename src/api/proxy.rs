//! Forwards pass-through requests to the upstream website

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::Error;

use super::routes::ApiResponse;
use super::server::AppState;

/// Admin uploads (notices, documents, gallery images) go through here
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Fallback handler: everything the gateway does not serve itself
pub async fn forward(State(state): State<AppState>, req: Request) -> Response {
    match forward_request(&state, req).await {
        Ok(response) => response,
        Err(ProxyError::BodyTooLarge) => {
            tracing::info!("Request body over {} bytes rejected", MAX_BODY_BYTES);
            (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ApiResponse::<()>::err("request body too large")),
            )
                .into_response()
        }
        Err(ProxyError::Upstream(e)) => {
            tracing::warn!("Upstream request failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::<()>::err("upstream unavailable")),
            )
                .into_response()
        }
    }
}

/// Why a request could not be forwarded
enum ProxyError {
    /// The client's body exceeds `MAX_BODY_BYTES` or could not be read
    BodyTooLarge,
    Upstream(Error),
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::Upstream(err.into())
    }
}

async fn forward_request(
    state: &AppState,
    req: Request,
) -> std::result::Result<Response, ProxyError> {
    let (parts, body) = req.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = upstream_url(&state.config.upstream.url, path_and_query);

    let body = to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        tracing::debug!("Failed to read request body: {}", e);
        ProxyError::BodyTooLarge
    })?;

    let mut headers = parts.headers;
    if let Some(host) = headers.remove(header::HOST) {
        headers.insert(HeaderName::from_static("x-forwarded-host"), host);
    }
    strip_hop_by_hop(&mut headers);

    let upstream = state
        .http
        .request(parts.method, url)
        .headers(headers)
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);
    let bytes = upstream.bytes().await?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

fn upstream_url(base: &str, path_and_query: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path_and_query)
}

fn strip_hop_by_hop(headers: &mut HeaderMap<HeaderValue>) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
