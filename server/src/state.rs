//! Application state management.

use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::gateway::{BackendClient, BackendConfig, Gateway, RestGateway};
use crate::mcp::{Catalog, McpHandler, McpSessionManager};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Live MCP sessions
    sessions: McpSessionManager,
    /// JSON-RPC method router
    handler: McpHandler,
}

impl AppState {
    /// Create application state from its parts.
    pub fn new(handler: McpHandler, sessions: McpSessionManager) -> Self {
        Self {
            inner: Arc::new(AppStateInner { sessions, handler }),
        }
    }

    /// State over an arbitrary gateway with the standard catalog.
    pub fn with_gateway(gateway: Arc<dyn Gateway>) -> anyhow::Result<Self> {
        let handler = McpHandler::new(gateway, Catalog::standard()?);
        Ok(Self::new(handler, McpSessionManager::new()))
    }

    /// Build the production state: REST gateway, standard catalog, and a
    /// session table sized by the session settings.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = BackendClient::new(BackendConfig {
            base_url: config.backend_url.clone(),
            token: config.backend_token.clone(),
            timeout: config.backend_timeout,
        })?;
        info!("Backend API at {}", client.base_url());

        let catalog = Catalog::standard()?;
        catalog.ensure_supported(RestGateway::supports, RestGateway::supports_resource)?;
        info!(
            "Catalog: {} tools, {} resources",
            catalog.tools().len(),
            catalog.resources().len()
        );

        let handler = McpHandler::new(Arc::new(RestGateway::new(client)), catalog)
            .with_tool_timeout(config.backend_timeout);
        let sessions = McpSessionManager::with_max_events(config.max_events);
        Ok(Self::new(handler, sessions))
    }

    pub fn sessions(&self) -> &McpSessionManager {
        &self.inner.sessions
    }

    pub fn handler(&self) -> &McpHandler {
        &self.inner.handler
    }
}
