//! Public service endpoints.

use axum::{extract::State, Extension, Json};
use podgate_types::{HealthResponse, InfoResponse, PROTOCOL_VERSION};
use std::sync::Arc;

use crate::auth::AuthConfig;
use crate::state::AppState;

const TRANSPORT: &str = "streamable-http";

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: crate::mcp::handler::SERVER_NAME.to_string(),
        transport: TRANSPORT.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Server identity, live session count and the served catalog.
#[utoipa::path(
    get,
    path = "/info",
    tag = "System",
    responses(
        (status = 200, description = "Server information", body = InfoResponse)
    )
)]
pub async fn info(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthConfig>>,
) -> Json<InfoResponse> {
    let handler = state.handler();
    let server_info = handler.server_info();
    Json(InfoResponse {
        name: server_info.name.clone(),
        version: server_info.version.clone(),
        protocol_version: PROTOCOL_VERSION.to_string(),
        transport: TRANSPORT.to_string(),
        active_sessions: state.sessions().session_count().await,
        auth_enabled: auth.enabled(),
        tools: handler.catalog().tool_names(),
        resources: handler.catalog().resource_uris(),
    })
}
