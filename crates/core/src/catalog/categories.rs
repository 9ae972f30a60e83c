//! Category CRUD operations.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::rusqlite::types::Value;

use super::Catalog;
use super::status::Status;
use super::update::{Field, UpdateBuilder};
use crate::Error;
use crate::store::row::{column_i64, decode};

/// A resource grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    pub status: Status,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// Active resources in this category, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_count: Option<i64>,
}

/// Fields for a new category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub status: Status,
}

/// Partial update of a category. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub sort_order: Option<i64>,
    pub status: Option<Status>,
}

/// Updatable category columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryField {
    Name,
    Description,
    Icon,
    SortOrder,
    Status,
}

impl Field for CategoryField {
    const TABLE: &'static str = "categories";

    fn column(self) -> &'static str {
        match self {
            CategoryField::Name => "name",
            CategoryField::Description => "description",
            CategoryField::Icon => "icon",
            CategoryField::SortOrder => "sort_order",
            CategoryField::Status => "status",
        }
    }
}

/// Per-category aggregate over active resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryStats {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub resource_count: i64,
    pub total_downloads: i64,
    pub latest_resource_date: Option<String>,
}

const CATEGORY_COLUMNS: &str = "c.id, c.name, c.description, c.icon, c.sort_order, c.status, c.created_at, c.updated_at";

impl Catalog {
    /// List active categories by sort order, optionally with active resource counts.
    pub async fn list_categories(&self, include_count: bool) -> Result<Vec<Category>, Error> {
        let sql = if include_count {
            format!(
                "SELECT {CATEGORY_COLUMNS}, COUNT(r.id) AS resource_count \
                 FROM categories c \
                 LEFT JOIN resources r ON c.id = r.category_id AND r.status = ? \
                 WHERE c.status = ? \
                 GROUP BY c.id \
                 ORDER BY c.sort_order ASC, c.created_at ASC, c.id ASC"
            )
        } else {
            format!(
                "SELECT {CATEGORY_COLUMNS} FROM categories c \
                 WHERE c.status = ? \
                 ORDER BY c.sort_order ASC, c.created_at ASC, c.id ASC"
            )
        };
        let params = if include_count {
            vec![Status::Active.into(), Status::Active.into()]
        } else {
            vec![Status::Active.into()]
        };

        let rows = self.executor.fetch_all(&sql, params).await?;
        rows.iter().map(decode).collect()
    }

    /// Get an active category with its active resource count.
    pub async fn get_category_by_id(&self, id: i64) -> Result<Option<Category>, Error> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS}, COUNT(r.id) AS resource_count \
             FROM categories c \
             LEFT JOIN resources r ON c.id = r.category_id AND r.status = ? \
             WHERE c.id = ? AND c.status = ? \
             GROUP BY c.id"
        );
        self.executor
            .fetch_optional(&sql, vec![Status::Active.into(), Value::Integer(id), Status::Active.into()])
            .await?
            .map(|row| decode(&row))
            .transpose()
    }

    /// Insert a category and return its id.
    pub async fn create_category(&self, category: NewCategory) -> Result<i64, Error> {
        if category.name.trim().is_empty() {
            return Err(Error::InvalidInput("category name must not be empty".into()));
        }

        let result = self
            .executor
            .run(
                "INSERT INTO categories (name, description, icon, sort_order, status) VALUES (?, ?, ?, ?, ?)",
                vec![
                    Value::Text(category.name),
                    category.description.into(),
                    category.icon.into(),
                    Value::Integer(category.sort_order),
                    category.status.into(),
                ],
            )
            .await?;

        tracing::info!(id = result.last_insert_id, "created category");
        Ok(result.last_insert_id)
    }

    /// Apply a partial update.
    ///
    /// Returns false if the patch is empty or no row has that id.
    pub async fn update_category(&self, id: i64, patch: CategoryPatch) -> Result<bool, Error> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(Error::InvalidInput("category name must not be empty".into()));
        }

        let mut update = UpdateBuilder::new();
        update
            .set_some(CategoryField::Name, patch.name)
            .set_some(CategoryField::Description, patch.description)
            .set_some(CategoryField::Icon, patch.icon)
            .set_some(CategoryField::SortOrder, patch.sort_order)
            .set_some(CategoryField::Status, patch.status);

        let Some((sql, params)) = update.build(id) else {
            return Ok(false);
        };
        Ok(self.executor.run(&sql, params).await?.rows_affected > 0)
    }

    /// Soft-delete a category.
    ///
    /// The active-resource check and the status change run in one
    /// transaction, so a resource created concurrently is either counted or
    /// inserted after the category is already inactive.
    ///
    /// # Errors
    ///
    /// Returns `Error::CategoryInUse` while active resources still reference
    /// it; the category is left untouched in that case.
    pub async fn delete_category(&self, id: i64) -> Result<bool, Error> {
        let deleted = self
            .executor
            .run_in_transaction(move |tx| {
                let rows = tx.fetch_all(
                    "SELECT COUNT(*) AS total FROM resources WHERE category_id = ? AND status = ?",
                    &[Value::Integer(id), Status::Active.into()],
                )?;
                let resources = match rows.first() {
                    Some(row) => column_i64(row, "total")?,
                    None => 0,
                };
                if resources > 0 {
                    return Err(Error::CategoryInUse { id, resources });
                }

                let mut update = UpdateBuilder::new();
                update.set(CategoryField::Status, Status::Inactive);
                match update.build(id) {
                    Some((sql, params)) => Ok(tx.run(&sql, &params)?.rows_affected > 0),
                    None => Ok(false),
                }
            })
            .await?;

        if deleted {
            tracing::info!(id, "deactivated category");
        }
        Ok(deleted)
    }

    /// Whether an active category already uses `name`, ignoring `exclude_id`.
    pub async fn category_name_exists(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, Error> {
        let mut sql = String::from("SELECT COUNT(*) AS total FROM categories WHERE name = ? AND status = ?");
        let mut params = vec![Value::Text(name.to_string()), Status::Active.into()];

        if let Some(id) = exclude_id {
            sql.push_str(" AND id != ?");
            params.push(Value::Integer(id));
        }

        Ok(self.executor.fetch_i64(&sql, params, "total").await? > 0)
    }

    /// Reassign sort positions atomically.
    ///
    /// Either every `(id, sort_order)` pair is applied or none is.
    pub async fn update_sort_order(&self, updates: Vec<(i64, i64)>) -> Result<(), Error> {
        if updates.is_empty() {
            return Ok(());
        }

        let count = updates.len();
        self.executor
            .run_in_transaction(move |tx| {
                for (id, sort_order) in updates {
                    let mut update = UpdateBuilder::new();
                    update.set(CategoryField::SortOrder, sort_order);
                    if let Some((sql, params)) = update.build(id) {
                        tx.run(&sql, &params)?;
                    }
                }
                Ok(())
            })
            .await?;

        tracing::info!(count, "reordered categories");
        Ok(())
    }

    /// Resource count, total downloads and latest addition per active category.
    pub async fn category_stats(&self) -> Result<Vec<CategoryStats>, Error> {
        let rows = self
            .executor
            .fetch_all(
                "SELECT c.id, c.name, c.icon,
                    COUNT(r.id) AS resource_count,
                    COALESCE(SUM(r.download_count), 0) AS total_downloads,
                    MAX(r.created_at) AS latest_resource_date
                FROM categories c
                LEFT JOIN resources r ON c.id = r.category_id AND r.status = ?
                WHERE c.status = ?
                GROUP BY c.id, c.name, c.icon
                ORDER BY resource_count DESC, c.sort_order ASC, c.id ASC",
                vec![Status::Active.into(), Status::Active.into()],
            )
            .await?;
        rows.iter().map(decode).collect()
    }
}
