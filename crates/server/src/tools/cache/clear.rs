//! cache_clear tool implementation.
//!
//! Drops every cached read so the next queries go to storage.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use toolshelf_core::Catalog;

use crate::tools::json_result;

/// Output from the cache_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearOutput {
    /// Number of entries removed.
    pub cleared: usize,
}

/// Implementation of the cache_clear tool.
pub async fn clear_impl(catalog: &Catalog) -> Result<CallToolResult, McpError> {
    json_result(&CacheClearOutput { cleared: catalog.clear_cache() })
}
