//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::orchestrator::ForecastOrchestrator;
use crate::tools::{CacheStatusParams, GetForecastParams, cache_status_impl, get_forecast_impl};
use std::sync::Arc;

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

/// The main MCP server handler for skycast.
#[derive(Clone)]
pub struct SkycastServer {
    tool_router: ToolRouter<Self>,
    orchestrator: Arc<ForecastOrchestrator>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SkycastServer {
    /// Create a new server handler around a ready pipeline.
    pub fn new(orchestrator: ForecastOrchestrator) -> Self {
        Self { tool_router: Self::tool_router(), orchestrator: Arc::new(orchestrator) }
    }

    /// Current weather, and optionally the 3-hour forecast, for an address.
    ///
    /// Results for a zip code are served from a 30 minute cache when possible.
    #[tool(
        description = "Get current weather for a US address, city/state, or zip code. Set include_forecast for the 5-day / 3-hour forecast. Results are cached per zip code for 30 minutes."
    )]
    async fn get_forecast(&self, params: Parameters<GetForecastParams>) -> Result<CallToolResult, McpError> {
        get_forecast_impl(&self.orchestrator, params.0).await
    }

    /// Cache freshness for a zip code.
    #[tool(description = "Report whether a zip code has a fresh cached forecast, how old it is, and how many entries exist.")]
    async fn forecast_cache_status(&self, params: Parameters<CacheStatusParams>) -> Result<CallToolResult, McpError> {
        cache_status_impl(self.orchestrator.cache(), params.0).await
    }
}

impl ServerHandler for SkycastServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "skycast".into(),
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
