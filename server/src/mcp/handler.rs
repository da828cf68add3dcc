//! MCP JSON-RPC request handler.
//!
//! Dispatches MCP methods against the gateway. The handler holds no session
//! state; the transport decides which session a request belongs to.

use podgate_types::jsonrpc::codes;
use podgate_types::mcp::{ResourcesCapability, ServerCapabilities, ToolsCapability};
use podgate_types::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcRequest, JsonRpcResponse,
    ReadResourceParams, ReadResourceResult, ResourceContents, ServerInfo, PROTOCOL_VERSION,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::catalog::Catalog;
use crate::gateway::Gateway;

/// Server name advertised in `initialize`.
pub const SERVER_NAME: &str = "podgate";

/// Upper bound for one tool invocation unless configured otherwise.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// MCP methods understood by the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpMethod {
    Initialize,
    Initialized,
    Ping,
    ToolsList,
    ToolsCall,
    ResourcesList,
    ResourcesRead,
    Cancelled,
}

/// Method name lookup table.
const METHODS: &[(&str, McpMethod)] = &[
    ("initialize", McpMethod::Initialize),
    ("notifications/initialized", McpMethod::Initialized),
    ("initialized", McpMethod::Initialized),
    ("ping", McpMethod::Ping),
    ("tools/list", McpMethod::ToolsList),
    ("tools/call", McpMethod::ToolsCall),
    ("resources/list", McpMethod::ResourcesList),
    ("resources/read", McpMethod::ResourcesRead),
    ("notifications/cancelled", McpMethod::Cancelled),
];

impl McpMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        METHODS
            .iter()
            .find(|(method, _)| *method == name)
            .map(|(_, method)| *method)
    }

    pub fn is_notification(self) -> bool {
        matches!(self, McpMethod::Initialized | McpMethod::Cancelled)
    }
}

/// MCP request handler.
#[derive(Clone)]
pub struct McpHandler {
    gateway: Arc<dyn Gateway>,
    catalog: Arc<Catalog>,
    tool_timeout: Duration,
    server_info: ServerInfo,
}

impl McpHandler {
    pub fn new(gateway: Arc<dyn Gateway>, catalog: Catalog) -> Self {
        Self {
            gateway,
            catalog: Arc::new(catalog),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Bound every tool invocation by `timeout`.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Handle an MCP JSON-RPC message.
    ///
    /// Returns `None` for notifications, which get no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;
        debug!("MCP: Handling method: {}", method);

        let Some(resolved) = McpMethod::from_name(&method) else {
            if id.is_none() {
                debug!("MCP: Ignoring unknown notification {}", method);
                return None;
            }
            return Some(JsonRpcResponse::error(
                id,
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            ));
        };

        if resolved.is_notification() || id.is_none() {
            return None;
        }

        let response = match resolved {
            McpMethod::Initialize => {
                JsonRpcResponse::success(id, to_value(self.initialize_result()))
            }
            McpMethod::Ping => JsonRpcResponse::success(id, json!({})),
            McpMethod::ToolsList => {
                JsonRpcResponse::success(id, json!({ "tools": self.catalog.tools() }))
            }
            McpMethod::ToolsCall => match parse_params::<CallToolParams>(params) {
                Ok(params) => JsonRpcResponse::success(id, to_value(self.call_tool(params).await)),
                Err(message) => JsonRpcResponse::error(id, codes::INVALID_PARAMS, message),
            },
            McpMethod::ResourcesList => {
                JsonRpcResponse::success(id, json!({ "resources": self.catalog.resources() }))
            }
            McpMethod::ResourcesRead => match parse_params::<ReadResourceParams>(params) {
                Ok(params) => self.read_resource(id, params).await,
                Err(message) => JsonRpcResponse::error(id, codes::INVALID_PARAMS, message),
            },
            McpMethod::Initialized | McpMethod::Cancelled => return None,
        };
        Some(response)
    }

    /// The `initialize` result. Identical on every call.
    pub fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
                resources: Some(ResourcesCapability::default()),
            },
            server_info: self.server_info.clone(),
            instructions: None,
        }
    }

    /// Run a tool. Every failure, including an unknown tool name or a
    /// timeout, comes back as an `isError` result rather than a JSON-RPC
    /// error.
    pub async fn call_tool(&self, params: CallToolParams) -> CallToolResult {
        let name = params.name;
        if self.catalog.tool(&name).is_none() {
            warn!("MCP: Unknown tool: {}", name);
            return CallToolResult::failure(format!("Unknown tool: {}", name));
        }

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        let call = self.gateway.invoke(&name, arguments);
        match tokio::time::timeout(self.tool_timeout, call).await {
            Ok(Ok(value)) => match serde_json::to_string_pretty(&value) {
                Ok(text) => CallToolResult::text(text),
                Err(e) => CallToolResult::failure(format!("Failed to encode result: {}", e)),
            },
            Ok(Err(e)) => {
                error!("MCP: Tool {} failed: {}", name, e);
                CallToolResult::failure(format!("Tool call failed: {}", e))
            }
            Err(_) => {
                error!(
                    "MCP: Tool {} timed out after {}s",
                    name,
                    self.tool_timeout.as_secs()
                );
                CallToolResult::failure(format!(
                    "Tool {} timed out after {}s",
                    name,
                    self.tool_timeout.as_secs()
                ))
            }
        }
    }

    async fn read_resource(&self, id: Option<Value>, params: ReadResourceParams) -> JsonRpcResponse {
        let uri = params.uri;
        let Some(resource) = self.catalog.resource(&uri) else {
            return JsonRpcResponse::error(
                id,
                codes::INVALID_PARAMS,
                format!("Unknown resource: {}", uri),
            );
        };
        let mime_type = resource.mime_type.clone();

        let read = self.gateway.read_resource(&uri);
        let value = match tokio::time::timeout(self.tool_timeout, read).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                error!("MCP: Reading resource {} failed: {}", uri, e);
                return JsonRpcResponse::error(
                    id,
                    codes::INTERNAL_ERROR,
                    format!("Failed to read resource {}: {}", uri, e),
                );
            }
            Err(_) => {
                return JsonRpcResponse::error(
                    id,
                    codes::INTERNAL_ERROR,
                    format!("Reading resource {} timed out", uri),
                );
            }
        };

        let text = match serde_json::to_string_pretty(&value) {
            Ok(text) => text,
            Err(e) => {
                return JsonRpcResponse::error(id, codes::INTERNAL_ERROR, e.to_string());
            }
        };
        let result = ReadResourceResult {
            contents: vec![ResourceContents {
                uri,
                mime_type,
                text,
            }],
        };
        JsonRpcResponse::success(id, to_value(result))
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, String> {
    serde_json::from_value(params.unwrap_or_else(|| json!({})))
        .map_err(|e| format!("Invalid params: {}", e))
}

fn to_value<T: serde::Serialize>(value: T) -> Value {
    // Our result types always serialize
    serde_json::to_value(value).unwrap_or(Value::Null)
}
