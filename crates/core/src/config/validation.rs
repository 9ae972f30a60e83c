//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Longest TTL accepted for cached read results (one day).
const MAX_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_ttl_secs` is 0 or exceeds one day
    /// - `cache_sweep_threshold` is 0
    /// - `default_page_size`, `max_page_size` or `popular_limit` is 0
    /// - `default_page_size` exceeds `max_page_size`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_secs".into(),
                reason: "must not exceed one day (86400s)".into(),
            });
        }

        if self.cache_sweep_threshold == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_sweep_threshold".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.max_page_size == 0 {
            return Err(ConfigError::Invalid { field: "max_page_size".into(), reason: "must be greater than 0".into() });
        }
        if self.default_page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "default_page_size".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::Invalid {
                field: "default_page_size".into(),
                reason: format!("must not exceed max_page_size ({})", self.max_page_size),
            });
        }

        if self.popular_limit == 0 {
            return Err(ConfigError::Invalid { field: "popular_limit".into(), reason: "must be greater than 0".into() });
        }

        if self.db_path.as_os_str().is_empty() {
            tracing::warn!("db_path is empty; SQLite will open a private temporary database");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = AppConfig { cache_ttl_secs: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_ttl_secs"));
    }

    #[test]
    fn test_validate_ttl_exceeds_limit() {
        let config = AppConfig { cache_ttl_secs: MAX_CACHE_TTL_SECS + 1, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_ttl_secs"));
    }

    #[test]
    fn test_validate_zero_sweep_threshold() {
        let config = AppConfig { cache_sweep_threshold: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_sweep_threshold"));
    }

    #[test]
    fn test_validate_default_page_above_max() {
        let config = AppConfig { default_page_size: 50, max_page_size: 20, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "default_page_size"));
    }

    #[test]
    fn test_validate_zero_popular_limit() {
        let config = AppConfig { popular_limit: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "popular_limit"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig {
            cache_ttl_secs: MAX_CACHE_TTL_SECS,
            cache_sweep_threshold: 1,
            default_page_size: 1,
            max_page_size: 1,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
