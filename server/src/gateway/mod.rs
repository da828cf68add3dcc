//! Gateway to the backend REST API.
//!
//! The MCP layer only sees the [`Gateway`] capability: invoke a named tool
//! with an argument bag, or read a resource by URI. [`RestGateway`] is the
//! production implementation over [`BackendClient`].

pub mod catalog;
mod client;
mod rest;

pub use client::{BackendClient, BackendConfig};
pub use rest::RestGateway;

use async_trait::async_trait;
use serde_json::Value;

/// Error type for gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Validation failed for {tool}: {report}")]
    Validation { tool: String, report: garde::Report },

    #[error("Backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Capability interface to the backend system.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Run a tool against the backend.
    async fn invoke(&self, tool: &str, arguments: Value) -> Result<Value>;

    /// Read a resource by URI.
    async fn read_resource(&self, uri: &str) -> Result<Value>;
}
