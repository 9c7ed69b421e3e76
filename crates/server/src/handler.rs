//! MCP server handler implementation.
//!
//! This module defines the host adapter that routes tool calls to the cache
//! worker's trigger events.
use std::sync::Arc;

use crate::tools::{
    Worker,
    fetch::{SwFetchParams, fetch_impl},
    lifecycle::{activate_impl, install_impl},
    stores::stores_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The MCP host adapter for one deployed worker version.
#[derive(Clone)]
pub struct SwCacheServer {
    worker: Arc<Worker>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl SwCacheServer {
    /// Create a new server handler around a worker.
    pub fn new(worker: Arc<Worker>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    /// Deliver the install event.
    #[tool(description = "Install this cache version: create its store and cache the seed resources.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    /// Deliver the activate event.
    #[tool(description = "Activate this cache version: delete stores from previous versions and claim clients.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Deliver a fetch event for one request.
    #[tool(description = "Intercept a request: serve GET requests cache-first, refilling the cache from the network.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    /// List the cache stores.
    #[tool(description = "List cache stores with their entry counts.")]
    async fn cache_stores(&self) -> Result<CallToolResult, McpError> {
        stores_impl(&self.worker).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
