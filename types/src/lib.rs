//! Shared types for the podgate MCP gateway.
//!
//! This crate contains the JSON-RPC envelope, the MCP payload shapes, and
//! the API types shared between the HTTP surface and the backend adapter.

/// Default port for the podgate server.
pub const DEFAULT_PORT: u16 = 3000;

/// Default base URL of the backend REST API.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

pub mod api;
pub mod jsonrpc;
pub mod mcp;

// Re-export commonly used types
pub use api::{HealthResponse, InfoResponse};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use mcp::{
    CallToolParams, CallToolResult, Content, InitializeResult, ReadResourceParams,
    ReadResourceResult, Resource, ResourceContents, ServerInfo, Tool, PROTOCOL_VERSION,
};
