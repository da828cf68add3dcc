//! OpenAPI documentation configuration.

use podgate_types::{HealthResponse, InfoResponse, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::mcp::mcp_post,
        crate::api::mcp::mcp_get,
        crate::api::mcp::mcp_delete,
        crate::api::health::health,
        crate::api::health::info,
    ),
    components(
        schemas(
            JsonRpcRequest,
            JsonRpcResponse,
            JsonRpcError,
            HealthResponse,
            InfoResponse,
        )
    ),
    tags(
        (name = "mcp", description = "MCP Streamable HTTP transport"),
        (name = "System", description = "Service information endpoints")
    ),
    info(
        title = "Podgate MCP Gateway",
        version = "0.3.1",
        description = "Model Context Protocol gateway to the pod and customer REST API",
        license(
            name = "MIT OR Apache-2.0"
        )
    )
)]
pub struct ApiDoc;
