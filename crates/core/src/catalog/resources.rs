//! Resource CRUD operations.
//!
//! Deletion is a status change; every read path filters to active rows.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::rusqlite::types::Value;

use super::Catalog;
use super::listing::{self, ResourcePage, ResourceQuery};
use super::status::Status;
use super::tags;
use super::update::{Field, UpdateBuilder};
use crate::Error;
use crate::store::row::decode;

/// Columns selected for a resource joined with its category (`r`, `c`).
pub(crate) const RESOURCE_COLUMNS: &str = "r.id, r.title, r.description, r.category_id, r.file_type, \
     r.file_size, r.download_url, r.download_password, r.thumbnail_url, \
     r.download_count, r.tags, r.status, r.created_at, r.updated_at, \
     c.name AS category_name, c.icon AS category_icon";

/// A downloadable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Resource {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub download_url: String,
    pub download_password: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub download_count: i64,
    #[serde(default, deserialize_with = "tags::deserialize")]
    pub tags: Vec<String>,
    pub status: Status,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub category_name: Option<String>,
    pub category_icon: Option<String>,
}

/// Fields for a new resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewResource {
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub original_filename: Option<String>,
    pub download_url: String,
    pub download_password: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Status,
}

/// Partial update of a resource. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResourcePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub download_url: Option<String>,
    pub download_password: Option<String>,
    pub thumbnail_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<Status>,
}

/// Updatable resource columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceField {
    Title,
    Description,
    CategoryId,
    FileType,
    FileSize,
    DownloadUrl,
    DownloadPassword,
    ThumbnailUrl,
    Tags,
    Status,
}

impl Field for ResourceField {
    const TABLE: &'static str = "resources";

    fn column(self) -> &'static str {
        match self {
            ResourceField::Title => "title",
            ResourceField::Description => "description",
            ResourceField::CategoryId => "category_id",
            ResourceField::FileType => "file_type",
            ResourceField::FileSize => "file_size",
            ResourceField::DownloadUrl => "download_url",
            ResourceField::DownloadPassword => "download_password",
            ResourceField::ThumbnailUrl => "thumbnail_url",
            ResourceField::Tags => "tags",
            ResourceField::Status => "status",
        }
    }
}

impl ResourcePatch {
    fn into_update(self) -> Result<UpdateBuilder<ResourceField>, Error> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(Error::InvalidInput("title must not be empty".into()));
        }
        if self.download_url.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(Error::InvalidInput("download_url must not be empty".into()));
        }

        let mut update = UpdateBuilder::new();
        update
            .set_some(ResourceField::Title, self.title)
            .set_some(ResourceField::Description, self.description)
            .set_some(ResourceField::CategoryId, self.category_id)
            .set_some(ResourceField::FileType, self.file_type)
            .set_some(ResourceField::FileSize, self.file_size)
            .set_some(ResourceField::DownloadUrl, self.download_url)
            .set_some(ResourceField::DownloadPassword, self.download_password)
            .set_some(ResourceField::ThumbnailUrl, self.thumbnail_url)
            .set_some(ResourceField::Status, self.status);
        if let Some(tags) = self.tags {
            update.set(ResourceField::Tags, tags::encode(&tags)?);
        }
        Ok(update)
    }
}

/// Where and what a client downloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DownloadInfo {
    pub id: i64,
    /// Route serving the file through the catalog.
    pub download_url: String,
    /// Upstream link recorded for the resource.
    pub source_url: String,
    pub filename: String,
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
    pub download_password: Option<String>,
}

impl Catalog {
    /// Fetch one page of resources.
    pub async fn list_resources(&self, query: &ResourceQuery) -> Result<ResourcePage, Error> {
        listing::list_resources(&self.executor, query).await
    }

    /// Get an active resource by id.
    ///
    /// Returns None if the id doesn't exist or the resource was deleted.
    pub async fn get_resource_by_id(&self, id: i64) -> Result<Option<Resource>, Error> {
        let sql = format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources r \
             LEFT JOIN categories c ON r.category_id = c.id \
             WHERE r.id = ? AND r.status = ?"
        );
        self.executor
            .fetch_optional(&sql, vec![Value::Integer(id), Status::Active.into()])
            .await?
            .map(|row| decode(&row))
            .transpose()
    }

    /// Insert a resource and return its id.
    pub async fn create_resource(&self, resource: NewResource) -> Result<i64, Error> {
        if resource.title.trim().is_empty() {
            return Err(Error::InvalidInput("title must not be empty".into()));
        }
        if resource.download_url.trim().is_empty() {
            return Err(Error::InvalidInput("download_url must not be empty".into()));
        }

        let tags = if resource.tags.is_empty() { None } else { Some(tags::encode(&resource.tags)?) };

        let result = self
            .executor
            .run(
                "INSERT INTO resources
                (title, description, category_id, file_type, file_size, original_filename,
                 download_url, download_password, thumbnail_url, tags, status)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                vec![
                    Value::Text(resource.title),
                    resource.description.into(),
                    resource.category_id.into(),
                    resource.file_type.into(),
                    resource.file_size.into(),
                    resource.original_filename.into(),
                    Value::Text(resource.download_url),
                    resource.download_password.into(),
                    resource.thumbnail_url.into(),
                    tags.into(),
                    resource.status.into(),
                ],
            )
            .await?;

        tracing::info!(id = result.last_insert_id, "created resource");
        Ok(result.last_insert_id)
    }

    /// Apply a partial update.
    ///
    /// Returns false if the patch is empty or no row has that id.
    pub async fn update_resource(&self, id: i64, patch: ResourcePatch) -> Result<bool, Error> {
        let Some((sql, params)) = patch.into_update()?.build(id) else {
            return Ok(false);
        };
        Ok(self.executor.run(&sql, params).await?.rows_affected > 0)
    }

    /// Soft-delete a resource.
    ///
    /// The row stays in storage with status `inactive`.
    pub async fn delete_resource(&self, id: i64) -> Result<bool, Error> {
        let mut update = UpdateBuilder::new();
        update.set(ResourceField::Status, Status::Inactive);
        let Some((sql, params)) = update.build(id) else {
            return Ok(false);
        };
        let deleted = self.executor.run(&sql, params).await?.rows_affected > 0;
        if deleted {
            tracing::info!(id, "deactivated resource");
        }
        Ok(deleted)
    }

    /// Record one download.
    pub async fn increment_download_count(&self, id: i64) -> Result<bool, Error> {
        let result = self
            .executor
            .run(
                "UPDATE resources SET download_count = download_count + 1 WHERE id = ?",
                vec![Value::Integer(id)],
            )
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Most downloaded active resources, newest first on ties.
    pub async fn popular_resources(&self, limit: u32) -> Result<Vec<Resource>, Error> {
        let sql = format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources r \
             LEFT JOIN categories c ON r.category_id = c.id \
             WHERE r.status = ? \
             ORDER BY r.download_count DESC, r.created_at DESC, r.id DESC \
             LIMIT ?"
        );
        let rows = self
            .executor
            .fetch_all(&sql, vec![Status::Active.into(), Value::Integer(i64::from(limit))])
            .await?;
        rows.iter().map(decode).collect()
    }

    /// Resolve download details for an active resource and count the download.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the resource doesn't exist or is inactive.
    pub async fn record_download(&self, id: i64) -> Result<DownloadInfo, Error> {
        let resource = self
            .get_resource_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("resource {id}")))?;

        self.increment_download_count(id).await?;

        Ok(DownloadInfo {
            id,
            download_url: format!("/api/resources/{id}/download"),
            source_url: resource.download_url,
            filename: resource.title,
            file_size: resource.file_size,
            file_type: resource.file_type,
            download_password: resource.download_password,
        })
    }
}
