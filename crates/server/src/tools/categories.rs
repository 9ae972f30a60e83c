//! Category tools.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use toolshelf_core::{Catalog, Error};

use super::json_result;

fn default_true() -> bool {
    true
}

/// Parameters for the category_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryListParams {
    /// Include the number of active resources per category (default: true).
    #[serde(default = "default_true")]
    pub include_count: bool,
}

impl Default for CategoryListParams {
    fn default() -> Self {
        Self { include_count: true }
    }
}

/// Implementation of the category_list tool.
pub async fn list_impl(catalog: &Catalog, params: CategoryListParams) -> Result<CallToolResult, McpError> {
    let categories = catalog.list_categories(params.include_count).await?;
    json_result(&categories)
}

/// Parameters for the category_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryGetParams {
    /// Category id.
    pub id: i64,
}

/// Implementation of the category_get tool.
pub async fn get_impl(catalog: &Catalog, params: CategoryGetParams) -> Result<CallToolResult, McpError> {
    let category = catalog
        .get_category_by_id(params.id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("category {}", params.id)))?;
    json_result(&category)
}

/// Implementation of the category_stats tool.
pub async fn stats_impl(catalog: &Catalog) -> Result<CallToolResult, McpError> {
    json_result(&catalog.category_stats().await?)
}
