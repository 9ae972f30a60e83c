//! cache_stats tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use toolshelf_core::Catalog;

use crate::tools::json_result;

/// Implementation of the cache_stats tool.
pub async fn stats_impl(catalog: &Catalog) -> Result<CallToolResult, McpError> {
    json_result(&catalog.cache_stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{catalog_with, output};
    use serde_json::Value;

    #[tokio::test]
    async fn test_stats_counts_hits_and_misses() {
        let (catalog, _) = catalog_with(&["Vim"]).await;
        catalog.list_categories(true).await.unwrap();
        catalog.list_categories(true).await.unwrap();

        let stats: Value = output(&stats_impl(&catalog).await.unwrap());
        assert_eq!(stats["entries"], 1);
        assert_eq!(stats["hits"], 1);
        assert_eq!(stats["misses"], 1);
    }
}
