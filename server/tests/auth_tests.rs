//! Integration tests for the API key gate.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::*;
use podgate::auth::AuthConfig;
use podgate::{create_app_with_auth, create_app_with_config};
use serde_json::json;

const KEY: &str = "K";

fn with_key(mut request: Request<Body>, key: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert("x-api-key", key.parse().unwrap());
    request
}

#[tokio::test]
async fn test_missing_key_is_unauthorized() {
    let (state, _) = test_state();
    let app = create_app_with_auth(state.clone(), AuthConfig::new(Some(KEY.to_string()), ""));

    let (status, headers, body) =
        send(&app, post("/mcp", None, &rpc(1, "initialize", json!({})))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], -32001);
    assert!(headers.get(SESSION_HEADER).is_none());
    assert_eq!(state.sessions().session_count().await, 0);
}

#[tokio::test]
async fn test_wrong_key_is_forbidden() {
    let (state, _) = test_state();
    let app = create_app_with_auth(state, AuthConfig::new(Some(KEY.to_string()), ""));

    let (status, _, body) = send(
        &app,
        with_key(post("/mcp", None, &rpc(1, "initialize", json!({}))), "wrong"),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], -32002);
}

#[tokio::test]
async fn test_correct_key_proceeds() {
    let (state, _) = test_state();
    let app = create_app_with_auth(state, AuthConfig::new(Some(KEY.to_string()), ""));

    let (status, headers, body) = send(
        &app,
        with_key(post("/mcp", None, &rpc(1, "initialize", json!({}))), KEY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["result"].is_object());
    let session = headers.get(SESSION_HEADER).unwrap().to_str().unwrap().to_string();

    let (status, _, _) = send(&app, request("DELETE", "/mcp", Some(&session))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        with_key(request("DELETE", "/mcp", Some(&session)), KEY),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_public_paths_bypass_gate() {
    let (state, _) = test_state();
    let app = create_app_with_auth(state, AuthConfig::new(Some(KEY.to_string()), ""));

    let (status, _, _) = send(&app, request("GET", "/health", None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(&app, request("GET", "/info", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["auth_enabled"], true);

    let (status, _, _) = send(&app, request("GET", "/api-docs/openapi.json", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_base_path_mounts_everything() {
    let (state, _) = test_state();
    let auth = AuthConfig::new(Some(KEY.to_string()), "/gateway");
    let app = create_app_with_config(state, auth, Vec::new(), "/gateway");

    let (status, _, _) = send(&app, request("GET", "/gateway/health", None)).await;
    assert_eq!(status, StatusCode::OK);

    let session = {
        let (status, headers, _) = send(
            &app,
            with_key(post("/gateway/mcp", None, &rpc(1, "initialize", json!({}))), KEY),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        headers.get(SESSION_HEADER).unwrap().to_str().unwrap().to_string()
    };

    let (status, _, body) = send(
        &app,
        with_key(post("/gateway/mcp", Some(&session), &rpc(2, "ping", json!({}))), KEY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], json!({}));

    let (status, _, _) = send(
        &app,
        with_key(post("/mcp", None, &rpc(1, "initialize", json!({}))), KEY),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_exposes_session_header() {
    let (state, _) = test_state();
    let app = create_app_with_auth(state, AuthConfig::new(Some(KEY.to_string()), ""));

    let preflight = Request::builder()
        .method("OPTIONS")
        .uri("/mcp")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "mcp-session-id,x-api-key")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&app, preflight).await;

    assert_eq!(status, StatusCode::OK);
    let allowed = headers
        .get("access-control-allow-headers")
        .unwrap()
        .to_str()
        .unwrap()
        .to_lowercase();
    assert!(allowed.contains("mcp-session-id"));
    assert!(allowed.contains("x-api-key"));

    let mut init_request = with_key(post("/mcp", None, &rpc(1, "initialize", json!({}))), KEY);
    init_request
        .headers_mut()
        .insert("origin", "http://localhost:5173".parse().unwrap());
    let (status, headers, _) = send(&app, init_request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers.get(SESSION_HEADER).is_some());
    let exposed = headers
        .get("access-control-expose-headers")
        .unwrap()
        .to_str()
        .unwrap()
        .to_lowercase();
    assert!(exposed.contains("mcp-session-id"));
}
