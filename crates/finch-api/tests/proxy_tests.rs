//! Integration tests for the forwarding proxy.
//!
//! Each test starts an in-process upstream on an ephemeral port and drives
//! the proxy router directly with `oneshot`.

use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::{RawQuery, State};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use finch_api::handlers::HealthResponse;
use finch_api::{create_router, AppState};
use finch_core::config::ProxyConfig;

// =============================================================================
// Helpers
// =============================================================================

/// What the upstream saw for one request.
#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    query: Option<String>,
    content_type: Option<String>,
    body: Vec<u8>,
}

type Log = Arc<Mutex<Vec<Seen>>>;

/// In-process backend bound to 127.0.0.1:0, aborted on drop.
struct MockUpstream {
    base_url: String,
    log: Log,
    handle: tokio::task::JoinHandle<()>,
}

impl MockUpstream {
    async fn start() -> Self {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/api/agent/ask",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({
                        "message": format!("echo: {}", body["text"].as_str().unwrap_or("")),
                        "context": {"lastParams": {"company_id": body["company_id"]}},
                    }))
                }),
            )
            .route(
                "/api/export/ar.csv",
                post(|| async {
                    (
                        [
                            (header::CONTENT_TYPE, "text/csv"),
                            (header::CONTENT_DISPOSITION, "attachment; filename=\"ar.csv\""),
                        ],
                        "invoice,amount\nINV-1,100\n",
                    )
                }),
            )
            .route(
                "/api/missing",
                get(|| async { (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))) }),
            )
            .route(
                "/api/echo",
                any(
                    |State(log): State<Log>,
                     method: Method,
                     RawQuery(query): RawQuery,
                     headers: axum::http::HeaderMap,
                     body: Bytes| async move {
                        log.lock().unwrap().push(Seen {
                            method,
                            query,
                            content_type: headers
                                .get(header::CONTENT_TYPE)
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string),
                            body: body.to_vec(),
                        });
                        Json(json!({"ok": true})).into_response()
                    },
                ),
            )
            .with_state(log.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}"),
            log,
            handle,
        }
    }

    fn seen(&self) -> Vec<Seen> {
        self.log.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn make_app(upstream: &str) -> Router {
    let state = AppState::new(ProxyConfig {
        upstream: upstream.to_string(),
        ..ProxyConfig::default()
    })
    .unwrap();
    create_router(state)
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

/// Read full response body bytes.
async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let app = make_app("http://localhost:8000/");
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.upstream, "http://localhost:8000");
}

// =============================================================================
// Forwarding
// =============================================================================

#[tokio::test]
async fn test_json_response_passes_through() {
    let upstream = MockUpstream::start().await;
    let app = make_app(&upstream.base_url);

    let resp = app
        .oneshot(post_json("/api/agent/ask", r#"{"text":"cash","company_id":7}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body["message"], "echo: cash");
    assert_eq!(body["context"]["lastParams"]["company_id"], 7);
}

#[tokio::test]
async fn test_binary_response_relayed_with_content_type() {
    let upstream = MockUpstream::start().await;
    let app = make_app(&upstream.base_url);

    let resp = app
        .oneshot(post_json("/api/export/ar.csv", r#"{"min_days_overdue":60}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"ar.csv\""
    );
    assert_eq!(body_bytes(resp).await, b"invoice,amount\nINV-1,100\n".to_vec());
}

#[tokio::test]
async fn test_upstream_status_relayed() {
    let upstream = MockUpstream::start().await;
    let app = make_app(&upstream.base_url);

    let resp = app
        .oneshot(Request::get("/api/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body["detail"], "Not found.");
}

#[tokio::test]
async fn test_get_forwards_query_without_body() {
    let upstream = MockUpstream::start().await;
    let app = make_app(&upstream.base_url);

    let resp = app
        .oneshot(
            Request::get("/api/echo?company_id=1&limit=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let seen = upstream.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, Method::GET);
    assert_eq!(seen[0].query.as_deref(), Some("company_id=1&limit=10"));
    assert!(seen[0].body.is_empty());
}

#[tokio::test]
async fn test_post_without_body_sends_empty_object() {
    let upstream = MockUpstream::start().await;
    let app = make_app(&upstream.base_url);

    app.oneshot(Request::post("/api/echo").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let seen = upstream.seen();
    assert_eq!(seen[0].method, Method::POST);
    assert_eq!(seen[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(serde_json::from_slice::<Value>(&seen[0].body).unwrap(), json!({}));
}

#[tokio::test]
async fn test_method_preserved() {
    let upstream = MockUpstream::start().await;
    let app = make_app(&upstream.base_url);

    let req = Request::builder()
        .method("PATCH")
        .uri("/api/echo")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"status":"paid"}"#))
        .unwrap();
    app.oneshot(req).await.unwrap();

    let seen = upstream.seen();
    assert_eq!(seen[0].method, Method::PATCH);
    assert_eq!(
        serde_json::from_slice::<Value>(&seen[0].body).unwrap(),
        json!({"status": "paid"})
    );
}

#[tokio::test]
async fn test_non_json_body_rejected() {
    let upstream = MockUpstream::start().await;
    let app = make_app(&upstream.base_url);

    let resp = app
        .oneshot(post_json("/api/echo", "text=cash"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(upstream.seen().is_empty());
}

#[tokio::test]
async fn test_upstream_down_is_500_with_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let app = make_app(&format!("http://{addr}"));
    let resp = app
        .oneshot(post_json("/api/agent/ask", r#"{"text":"cash"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(body["error"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn test_unknown_root_path_not_forwarded() {
    let upstream = MockUpstream::start().await;
    let app = make_app(&upstream.base_url);

    let resp = app
        .oneshot(Request::get("/echo").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(upstream.seen().is_empty());
}
