//! Category and resource repositories.
//!
//! [`Catalog`] owns a [`QueryExecutor`]; every repository method is built on
//! it, so reads are cached and writes invalidate what they touch.

pub mod categories;
pub mod listing;
pub mod resources;
pub mod seed;
pub mod status;
pub mod tags;
pub mod update;

pub use categories::{Category, CategoryPatch, CategoryStats, NewCategory};
pub use listing::{ResourcePage, ResourceQuery, SortField, SortOrder};
pub use resources::{DownloadInfo, NewResource, Resource, ResourcePatch};
pub use seed::SeedReport;
pub use status::Status;

use crate::Error;
use crate::cache::{CacheStats, QueryCache};
use crate::config::AppConfig;
use crate::executor::QueryExecutor;
use crate::store::Store;

/// Data access for categories and resources.
#[derive(Clone, Debug)]
pub struct Catalog {
    executor: QueryExecutor,
}

impl Catalog {
    /// Open the configured database, seeding defaults when enabled.
    pub async fn open(config: &AppConfig) -> Result<Self, Error> {
        let store = Store::open(&config.db_path).await?;
        let catalog = Self::from_executor(QueryExecutor::new(store, QueryCache::new(config.cache_settings())));

        if config.seed_defaults {
            catalog.seed_defaults().await?;
        }

        tracing::info!(path = %config.db_path.display(), "catalog ready");
        Ok(catalog)
    }

    /// Empty in-memory catalog with default cache settings.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let store = Store::open_in_memory().await?;
        Ok(Self::from_executor(QueryExecutor::new(store, QueryCache::default())))
    }

    pub fn from_executor(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    /// Drop every cached read. Returns the number of entries removed.
    pub fn clear_cache(&self) -> usize {
        self.executor.clear_cache()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.executor.cache_stats()
    }
}
