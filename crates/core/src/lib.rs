//! Core data access for toolshelf.
//!
//! This crate provides:
//! - SQLite storage with versioned migrations
//! - An in-memory query cache with table-scoped invalidation
//! - A cache-aware query executor and transactions
//! - Category and resource repositories, including paginated listing
//! - Unified error types and configuration

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod store;

pub use cache::{CacheSettings, CacheStats, QueryCache};
pub use catalog::{
    Catalog, Category, CategoryStats, DownloadInfo, NewCategory, NewResource, Resource, ResourcePage, ResourceQuery,
    SortField, SortOrder, Status,
};
pub use config::AppConfig;
pub use error::Error;
pub use executor::{QueryExecutor, QueryOutput, WriteResult};
pub use store::{Row, Store};
