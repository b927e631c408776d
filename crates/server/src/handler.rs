//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::state::AppState;
use crate::tools::cache::{deploy_impl, get_impl, purge_impl, status_impl};
use crate::tools::site_fetch::fetch_impl;
use crate::tools::{CacheDeployParams, CacheGetParams, CachePurgeParams, CacheStatusParams, SiteFetchParams};

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

/// The main MCP server handler for offcache.
#[derive(Clone)]
pub struct OffcacheServer {
    state: Arc<AppState>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl OffcacheServer {
    /// Create a new server handler over shared state.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state, tool_router: Self::tool_router() }
    }

    /// Serve a request through the active version's cache strategies.
    ///
    /// Same-origin requests are classified and answered from the cache, the network, or an offline fallback.
    /// Cross-origin requests and requests made before any version is active go straight to the network.
    #[tool(
        description = "Fetch a site URL through the offline cache. Reports which strategy handled it and whether the response came from cache, network, or an offline fallback."
    )]
    async fn site_fetch(&self, params: Parameters<SiteFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }

    /// Install and activate a cache version.
    #[tool(
        description = "Deploy a cache version: precache the asset manifest, then activate it and evict old partitions. Set promote=true to activate a waiting version."
    )]
    async fn cache_deploy(&self, params: Parameters<CacheDeployParams>) -> Result<CallToolResult, McpError> {
        deploy_impl(&self.state, params.0).await
    }

    /// Report active and waiting versions with partition sizes.
    #[tool(description = "Show the active and waiting cache versions and the size of each cache partition.")]
    async fn cache_status(&self, params: Parameters<CacheStatusParams>) -> Result<CallToolResult, McpError> {
        status_impl(&self.state, params.0).await
    }

    /// Read a single stored entry.
    #[tool(description = "Read a cached entry by URL. Looks in the active version's partitions unless one is named.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.state, params.0).await
    }

    /// Delete partitions.
    #[tool(description = "Delete a cache partition by name, or all partitions with all=true.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.state, params.0).await
    }
}

impl ServerHandler for OffcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "offcache".into(),
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
