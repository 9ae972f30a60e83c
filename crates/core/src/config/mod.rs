//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (TOOLSHELF_*)
//! 2. TOML config file (if TOOLSHELF_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::CacheSettings;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (TOOLSHELF_*)
/// 2. TOML config file (if TOOLSHELF_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite catalog database.
    ///
    /// Set via TOOLSHELF_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// How long a cached read result stays servable, in seconds.
    ///
    /// Set via TOOLSHELF_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Entry count above which a put triggers a sweep of expired entries.
    ///
    /// Set via TOOLSHELF_CACHE_SWEEP_THRESHOLD environment variable.
    #[serde(default = "default_cache_sweep_threshold")]
    pub cache_sweep_threshold: usize,

    /// Page size used when a listing request omits `limit` or passes 0.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper bound for a listing page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Number of rows returned by the popular resources listing.
    #[serde(default = "default_popular_limit")]
    pub popular_limit: u32,

    /// Insert the default categories and sample resources into an empty catalog.
    ///
    /// Set via TOOLSHELF_SEED_DEFAULTS environment variable.
    #[serde(default = "default_true")]
    pub seed_defaults: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./toolshelf.sqlite")
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_sweep_threshold() -> usize {
    100
}

fn default_page_size() -> u32 {
    12
}

fn default_max_page_size() -> u32 {
    100
}

fn default_popular_limit() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_sweep_threshold: default_cache_sweep_threshold(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            popular_limit: default_popular_limit(),
            seed_defaults: true,
        }
    }
}

impl AppConfig {
    /// Cache TTL as Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Query cache settings derived from this configuration.
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings { ttl: self.cache_ttl(), sweep_threshold: self.cache_sweep_threshold }
    }

    /// Resolve the page size for a listing request.
    ///
    /// A missing or zero limit falls back to `default_page_size`; anything
    /// larger than `max_page_size` is capped.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        match requested {
            None | Some(0) => self.default_page_size,
            Some(n) => n.min(self.max_page_size),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `TOOLSHELF_`
    /// 2. TOML file from `TOOLSHELF_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("TOOLSHELF_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("TOOLSHELF_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
