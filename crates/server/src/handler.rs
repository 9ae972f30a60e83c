//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{
    cache,
    categories::{self, CategoryGetParams, CategoryListParams},
    resources::{self, ResourceIdParams, ResourceListParams, ResourcePopularParams},
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
use toolshelf_core::{AppConfig, Catalog};

/// The main MCP server handler for toolshelf.
#[derive(Clone)]
pub struct ToolshelfServer {
    catalog: Catalog,
    config: AppConfig,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ToolshelfServer {
    pub fn new(catalog: Catalog, config: AppConfig) -> Self {
        Self { catalog, config, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "List active resources with pagination. Supports category filter, case-insensitive search over title and description, and sorting by created_at, download_count or title."
    )]
    async fn resource_list(&self, params: Parameters<ResourceListParams>) -> Result<CallToolResult, McpError> {
        resources::list_impl(&self.catalog, &self.config, params.0).await
    }

    #[tool(description = "Get one active resource by id, including its category name and icon.")]
    async fn resource_get(&self, params: Parameters<ResourceIdParams>) -> Result<CallToolResult, McpError> {
        resources::get_impl(&self.catalog, params.0).await
    }

    #[tool(description = "List the most downloaded active resources.")]
    async fn resource_popular(&self, params: Parameters<ResourcePopularParams>) -> Result<CallToolResult, McpError> {
        resources::popular_impl(&self.catalog, &self.config, params.0).await
    }

    /// Counts the download, so repeated calls raise the resource's popularity.
    #[tool(description = "Resolve download details for a resource and record the download.")]
    async fn resource_download(&self, params: Parameters<ResourceIdParams>) -> Result<CallToolResult, McpError> {
        resources::download_impl(&self.catalog, params.0).await
    }

    #[tool(description = "List active categories in display order, optionally with active resource counts.")]
    async fn category_list(&self, params: Parameters<CategoryListParams>) -> Result<CallToolResult, McpError> {
        categories::list_impl(&self.catalog, params.0).await
    }

    #[tool(description = "Get one active category by id with its active resource count.")]
    async fn category_get(&self, params: Parameters<CategoryGetParams>) -> Result<CallToolResult, McpError> {
        categories::get_impl(&self.catalog, params.0).await
    }

    #[tool(description = "Per-category resource counts, total downloads and latest addition date.")]
    async fn category_stats(&self) -> Result<CallToolResult, McpError> {
        categories::stats_impl(&self.catalog).await
    }

    #[tool(description = "Report query cache entry count and hit/miss counters.")]
    async fn cache_stats(&self) -> Result<CallToolResult, McpError> {
        cache::stats_impl(&self.catalog).await
    }

    #[tool(description = "Drop every cached query result. Returns the number of entries removed.")]
    async fn cache_clear(&self) -> Result<CallToolResult, McpError> {
        cache::clear_impl(&self.catalog).await
    }
}

impl ServerHandler for ToolshelfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "toolshelf".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some("Browse a catalog of downloadable tools organized by category.".into()),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_router_lists_every_tool() {
        let catalog = Catalog::open_in_memory().await.unwrap();
        let server = ToolshelfServer::new(catalog, AppConfig::default());

        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();

        assert_eq!(names, vec![
            "cache_clear",
            "cache_stats",
            "category_get",
            "category_list",
            "category_stats",
            "resource_download",
            "resource_get",
            "resource_list",
            "resource_popular",
        ]);
    }

    #[tokio::test]
    async fn test_server_info() {
        let catalog = Catalog::open_in_memory().await.unwrap();
        let info = ToolshelfServer::new(catalog, AppConfig::default()).get_info();
        assert_eq!(info.server_info.name, "toolshelf");
        assert!(info.capabilities.tools.is_some());
    }
}
