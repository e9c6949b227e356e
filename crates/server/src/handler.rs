//! MCP server handler implementation.
//!
//! This module defines the main server handler that routes tool calls to
//! the cache controller. The handler plays the host: it decides whether the
//! worker is active enough to see a fetch, and performs the default network
//! fetch when it is not.
use std::sync::Arc;

use crate::tools::{
    SwFetchParams, SwMessageParams,
    cache::{CacheGetParams, get_impl},
    fetch::fetch_impl,
    lifecycle::{activate_impl, install_impl},
    message::message_impl,
    status::status_impl,
};

use cyft_client::{CacheController, Fetcher};
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

/// The main MCP server handler for cyft-sw.
#[derive(Clone)]
pub struct CyftSwServer {
    controller: CacheController,
    /// Default fetch for requests the worker does not handle.
    network: Arc<dyn Fetcher>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl CyftSwServer {
    /// Create a new server handler.
    pub fn new(controller: CacheController, network: Arc<dyn Fetcher>) -> Self {
        Self { controller, network, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Issue a request through the service worker. Returns status, headers, body and whether it came from network, cache, offline fallback or passthrough."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.controller, self.network.as_ref(), params.0).await
    }

    #[tool(description = "Post a control message (SKIP_WAITING, CLEAR_CACHE, CACHE_URLS) to the service worker.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.controller, params.0).await
    }

    #[tool(description = "Run the install phase: pre-cache critical assets into the static cache.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.controller).await
    }

    #[tool(description = "Run the activate phase: delete caches from other versions and claim clients.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.controller).await
    }

    #[tool(description = "Report worker state, version and every cache with its entry count.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.controller).await
    }

    #[tool(description = "Inspect stored entries for a URL across all caches.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.controller, params.0).await
    }
}

impl ServerHandler for CyftSwServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "cyft-sw".into(),
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
