//! Route handlers: health check and the `/api/*` forwarder.

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

/// Response headers relayed from the upstream besides the status.
const RELAYED_HEADERS: [header::HeaderName; 2] =
    [header::CONTENT_TYPE, header::CONTENT_DISPOSITION];

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub upstream: String,
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        upstream: state.upstream().to_string(),
    })
}

/// ANY /api/{*path} - forward to `{upstream}/api/{path}`.
///
/// The method and query string are preserved. GET and HEAD carry no body;
/// any other method carries the client's JSON body, or `{}` when it sent none.
pub async fn forward(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    method: Method,
    body: Bytes,
) -> Result<Response, ApiError> {
    let mut url = format!("{}/api/{}", state.upstream(), path);
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(&q);
    }

    let mut request = state.http_client.request(method.clone(), &url);
    if method != Method::GET && method != Method::HEAD {
        request = request.json(&json_body(&body)?);
    }

    tracing::debug!(method = %method, path = %path, "Forwarding request upstream");

    let upstream = request.send().await.map_err(|e| {
        tracing::warn!(method = %method, path = %path, error = %e, "Upstream request failed");
        ApiError::from(e)
    })?;

    let status = upstream.status();
    let headers = relayed_headers(upstream.headers());
    let bytes = upstream.bytes().await?;

    tracing::debug!(
        status = status.as_u16(),
        path = %path,
        size = bytes.len(),
        "Relaying upstream response"
    );

    Ok((status, headers, bytes).into_response())
}

/// Parse the client body as JSON; an empty body becomes `{}`.
fn json_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("request body is not valid JSON: {}", e)))
}

/// Copy the relayed headers; a missing content type becomes octet-stream.
fn relayed_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in RELAYED_HEADERS {
        if let Some(value) = upstream.get(&name) {
            headers.insert(name, value.clone());
        }
    }
    headers
        .entry(header::CONTENT_TYPE)
        .or_insert(HeaderValue::from_static("application/octet-stream"));
    headers
}
