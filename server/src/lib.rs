//! Podgate MCP gateway library.
//!
//! This module exposes the application builder for use in tests.

use axum::http::HeaderValue;
use axum::http::{header, HeaderName, Method};
use axum::{
    middleware,
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mcp;
pub mod openapi;
pub mod state;

use state::AppState;

/// Create the Axum application router with authentication disabled.
///
/// This function is used both by the main server binary and by integration tests.
pub fn create_app(state: AppState) -> Router {
    create_app_with_auth(state, auth::AuthConfig::disabled())
}

/// Create the Axum application router with a given auth configuration.
pub fn create_app_with_auth(state: AppState, auth_config: auth::AuthConfig) -> Router {
    create_app_with_config(state, auth_config, Vec::new(), "")
}

/// Create the Axum application router with auth configuration, CORS origins
/// and a mount point.
///
/// If `cors_allowed_origins` is empty, any origin is allowed.
/// Otherwise, only the specified origins are allowed. `base_path` must be
/// normalized (see [`config::normalize_base_path`]); the auth config's
/// public paths must be built for the same base path.
pub fn create_app_with_config(
    state: AppState,
    auth_config: auth::AuthConfig,
    cors_allowed_origins: Vec<String>,
    base_path: &str,
) -> Router {
    let auth_config = Arc::new(auth_config);

    if auth_config.enabled() {
        tracing::info!("Authentication enabled (X-API-Key)");
    } else {
        tracing::warn!("Authentication disabled - all endpoints are public!");
    }

    let routes = Router::new()
        .route(
            "/mcp",
            get(api::mcp::mcp_get)
                .post(api::mcp::mcp_post)
                .delete(api::mcp::mcp_delete),
        )
        .route("/health", get(api::health::health))
        .route("/info", get(api::health::info))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(openapi::ApiDoc::openapi()) }),
        );

    let router = if base_path.is_empty() {
        routes
    } else {
        Router::new().nest(base_path, routes)
    };

    router
        .with_state(state)
        .layer(middleware::from_fn(auth::auth_middleware))
        .layer(Extension(auth_config))
        .layer(TraceLayer::new_for_http())
        .layer({
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    HeaderName::from_static(api::mcp::MCP_SESSION_ID_HEADER),
                    HeaderName::from_static(api::mcp::LAST_EVENT_ID_HEADER),
                    HeaderName::from_static(auth::API_KEY_HEADER),
                ])
                .expose_headers([HeaderName::from_static(api::mcp::MCP_SESSION_ID_HEADER)]);

            // If no origins specified, allow any origin
            // Otherwise, restrict to the specified origins
            if cors_allowed_origins.is_empty() {
                cors.allow_origin(Any)
            } else {
                let origins: Vec<HeaderValue> = cors_allowed_origins
                    .iter()
                    .filter_map(|o| o.parse::<HeaderValue>().ok())
                    .collect();
                cors.allow_origin(origins)
            }
        })
}
