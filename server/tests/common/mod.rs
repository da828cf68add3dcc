//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use podgate::gateway::{Gateway, GatewayError, Result as GatewayResult};
use podgate::state::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Notify;
use tower::ServiceExt; // for `oneshot`

pub const SESSION_HEADER: &str = "mcp-session-id";

/// In-process stand-in for the backend.
///
/// `list_pods` blocks until `release` is notified, which lets tests hold a
/// request open inside a session.
#[derive(Default)]
pub struct MockGateway {
    pub release: Arc<Notify>,
}

#[async_trait]
impl Gateway for MockGateway {
    async fn invoke(&self, tool: &str, arguments: Value) -> GatewayResult<Value> {
        match tool {
            "get_pod" => Ok(json!({ "id": arguments["pod_id"], "status": "running" })),
            "list_pods" => {
                self.release.notified().await;
                Ok(json!([{ "id": "p1" }]))
            }
            "delete_pod" => Err(GatewayError::Status {
                status: 404,
                body: "pod not found".to_string(),
            }),
            _ => Err(GatewayError::UnknownTool(tool.to_string())),
        }
    }

    async fn read_resource(&self, uri: &str) -> GatewayResult<Value> {
        Ok(json!({ "uri": uri, "items": [] }))
    }
}

/// State over a fresh mock gateway, plus the handle that unblocks `list_pods`.
pub fn test_state() -> (AppState, Arc<Notify>) {
    let gateway = MockGateway::default();
    let release = Arc::clone(&gateway.release);
    let state = AppState::with_gateway(Arc::new(gateway)).unwrap();
    (state, release)
}

pub fn rpc(id: i64, method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params })
}

pub fn post(path: &str, session: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .header("accept", "application/json, text/event-stream");
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn request(method: &str, path: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::empty()).unwrap()
}

/// Send a request and collect status, headers and JSON body (`Null` if empty).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, headers, value)
}

/// Run `initialize` and return the assigned session id.
pub async fn initialize(app: &Router, path: &str) -> String {
    let (status, headers, body) = send(
        app,
        post(path, None, &rpc(0, "initialize", json!({ "protocolVersion": "2025-03-26" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "initialize failed: {}", body);
    headers
        .get(SESSION_HEADER)
        .expect("initialize must return a session id")
        .to_str()
        .unwrap()
        .to_string()
}
