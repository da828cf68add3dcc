//! MCP (Model Context Protocol) Streamable HTTP support.
//!
//! This module holds the transport-independent half of the gateway: session
//! bookkeeping, the per-session replayable event log, the tool/resource
//! catalog, and the JSON-RPC method router. The HTTP endpoints live in
//! [`crate::api::mcp`].
//!
//! ## Session Management
//!
//! Sessions are identified by the `Mcp-Session-Id` header, assigned during
//! initialization and required for subsequent requests. Every response sent
//! within a session is recorded in its event log so a reconnecting SSE
//! client can resume with `Last-Event-Id`.

pub mod catalog;
pub mod event_log;
pub mod handler;
pub mod session;

pub use catalog::{Catalog, CatalogError};
pub use event_log::{EventId, EventLog, StoredEvent};
pub use handler::McpHandler;
pub use session::{McpSession, McpSessionManager, SessionState, StreamGuard};
