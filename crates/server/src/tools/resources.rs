//! Resource tools: listing, lookup, popularity and download bookkeeping.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use toolshelf_core::{
    AppConfig, Catalog, DownloadInfo, Error, Resource, ResourceQuery, SortField, SortOrder, Status,
};

use super::json_result;

/// Parameters for the resource_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ResourceListParams {
    /// 1-based page number (default: 1).
    #[serde(default)]
    pub page: Option<u32>,

    /// Rows per page. Falls back to the configured default and is capped at the configured maximum.
    #[serde(default)]
    pub limit: Option<u32>,

    /// Only resources in this category.
    #[serde(default)]
    pub category_id: Option<i64>,

    /// Case-insensitive substring matched against title and description.
    #[serde(default)]
    pub search: Option<String>,

    /// One of "created_at" (default), "download_count" or "title".
    #[serde(default)]
    pub sort_by: Option<String>,

    /// "ASC" or "DESC" (default).
    #[serde(default)]
    pub sort_order: Option<String>,

    /// "active" (default) or "inactive" to browse soft-deleted resources.
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

/// Output from the resource_list tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ResourceListOutput {
    pub resources: Vec<Resource>,
    pub pagination: Pagination,
}

impl ResourceListParams {
    fn into_query(self, config: &AppConfig) -> Result<ResourceQuery, Error> {
        let mut query = ResourceQuery {
            page: self.page.unwrap_or(1).max(1),
            limit: config.page_size(self.limit),
            category_id: self.category_id,
            search: self.search,
            ..Default::default()
        };
        if let Some(sort_by) = self.sort_by.as_deref() {
            query.sort_by = sort_by.parse::<SortField>()?;
        }
        if let Some(sort_order) = self.sort_order.as_deref() {
            query.sort_order = sort_order.parse::<SortOrder>()?;
        }
        if let Some(status) = self.status.as_deref() {
            query.status = status.parse::<Status>()?;
        }
        Ok(query)
    }
}

/// Implementation of the resource_list tool.
pub async fn list_impl(
    catalog: &Catalog, config: &AppConfig, params: ResourceListParams,
) -> Result<CallToolResult, McpError> {
    let query = params.into_query(config)?;
    let page = catalog.list_resources(&query).await?;

    let pagination = Pagination {
        page: query.page,
        limit: query.limit,
        total: page.total,
        total_pages: page.total_pages(query.limit),
    };
    json_result(&ResourceListOutput { resources: page.rows, pagination })
}

/// Parameters for tools addressing a single resource.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourceIdParams {
    /// Resource id.
    pub id: i64,
}

/// Implementation of the resource_get tool.
pub async fn get_impl(catalog: &Catalog, params: ResourceIdParams) -> Result<CallToolResult, McpError> {
    let resource = catalog
        .get_resource_by_id(params.id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("resource {}", params.id)))?;
    json_result(&resource)
}

/// Parameters for the resource_popular tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ResourcePopularParams {
    /// Number of resources to return (default: configured popular limit).
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Implementation of the resource_popular tool.
pub async fn popular_impl(
    catalog: &Catalog, config: &AppConfig, params: ResourcePopularParams,
) -> Result<CallToolResult, McpError> {
    let limit = params
        .limit
        .filter(|&l| l > 0)
        .unwrap_or(config.popular_limit)
        .min(config.max_page_size);
    let resources = catalog.popular_resources(limit).await?;
    json_result(&resources)
}

/// Implementation of the resource_download tool.
pub async fn download_impl(catalog: &Catalog, params: ResourceIdParams) -> Result<CallToolResult, McpError> {
    let info: DownloadInfo = catalog.record_download(params.id).await?;
    json_result(&info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{catalog_with, output};
    use serde_json::Value;

    fn titles(resources: &Value) -> Vec<&str> {
        resources
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["title"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_list_defaults() {
        let (catalog, _) = catalog_with(&["Vim", "Emacs", "Helix"]).await;
        let config = AppConfig::default();

        let result = list_impl(&catalog, &config, ResourceListParams::default()).await.unwrap();
        let out: Value = output(&result);
        let pagination: Pagination = serde_json::from_value(out["pagination"].clone()).unwrap();

        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, config.default_page_size);
        assert_eq!(pagination.total, 3);
        assert_eq!(pagination.total_pages, 1);
        assert_eq!(titles(&out["resources"]), vec!["Helix", "Emacs", "Vim"]);
        assert_eq!(out["resources"][0]["tags"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_list_sorted_and_paged() {
        let (catalog, _) = catalog_with(&["Vim", "Emacs", "Helix"]).await;
        let params = ResourceListParams {
            page: Some(2),
            limit: Some(2),
            sort_by: Some("title".into()),
            sort_order: Some("asc".into()),
            ..Default::default()
        };

        let out: Value = output(&list_impl(&catalog, &AppConfig::default(), params).await.unwrap());
        assert_eq!(titles(&out["resources"]), vec!["Vim"]);
        assert_eq!(out["pagination"]["total_pages"], 2);
    }

    #[tokio::test]
    async fn test_list_limit_is_capped() {
        let (catalog, _) = catalog_with(&["Vim"]).await;
        let config = AppConfig { max_page_size: 50, ..AppConfig::default() };
        let params = ResourceListParams { limit: Some(10_000), ..Default::default() };

        let out: Value = output(&list_impl(&catalog, &config, params).await.unwrap());
        assert_eq!(out["pagination"]["limit"], 50);
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_sort() {
        let (catalog, _) = catalog_with(&[]).await;
        let params = ResourceListParams { sort_by: Some("file_size".into()), ..Default::default() };

        let err = list_impl(&catalog, &AppConfig::default(), params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let (catalog, _) = catalog_with(&["Vim", "Emacs"]).await;
        let config = AppConfig::default();
        let all: Value = output(&list_impl(&catalog, &config, ResourceListParams::default()).await.unwrap());
        let vim = all["resources"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["title"] == "Vim")
            .and_then(|r| r["id"].as_i64())
            .unwrap();
        catalog.delete_resource(vim).await.unwrap();

        let active: Value = output(&list_impl(&catalog, &config, ResourceListParams::default()).await.unwrap());
        assert_eq!(titles(&active["resources"]), vec!["Emacs"]);

        let params = ResourceListParams { status: Some("Inactive".into()), ..Default::default() };
        let inactive: Value = output(&list_impl(&catalog, &config, params).await.unwrap());
        assert_eq!(titles(&inactive["resources"]), vec!["Vim"]);
        assert_eq!(inactive["resources"][0]["status"], "inactive");

        let params = ResourceListParams { status: Some("deleted".into()), ..Default::default() };
        let err = list_impl(&catalog, &config, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_get_found_and_missing() {
        let (catalog, category) = catalog_with(&["Vim"]).await;

        let found: Value = output(&get_impl(&catalog, ResourceIdParams { id: 1 }).await.unwrap());
        assert_eq!(found["title"], "Vim");
        assert_eq!(found["category_id"], category);

        let err = get_impl(&catalog, ResourceIdParams { id: 7 }).await.unwrap_err();
        assert_eq!(err.code.0, -32004);
    }

    #[tokio::test]
    async fn test_download_then_popular() {
        let (catalog, _) = catalog_with(&["Vim", "Emacs"]).await;

        let info: DownloadInfo = output(&download_impl(&catalog, ResourceIdParams { id: 2 }).await.unwrap());
        assert_eq!(info.download_url, "/api/resources/2/download");
        assert_eq!(info.source_url, "https://example.com/emacs");

        let popular: Value =
            output(&popular_impl(&catalog, &AppConfig::default(), ResourcePopularParams::default()).await.unwrap());
        assert_eq!(titles(&popular), vec!["Emacs", "Vim"]);
        assert_eq!(popular[0]["download_count"], 1);
    }

    #[tokio::test]
    async fn test_download_missing_resource() {
        let (catalog, _) = catalog_with(&[]).await;
        let err = download_impl(&catalog, ResourceIdParams { id: 1 }).await.unwrap_err();
        assert_eq!(err.code.0, -32004);
    }
}
