//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;
use url::Url;

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
    /// - `version` is empty or does not start with `cache_prefix`
    /// - `origin` is not an absolute http(s) URL
    /// - `retry_attempts` is outside 1..=10, or fewer delays than retries
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_bytes` is 0 or exceeds 100MB
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.is_empty() {
            return Err(ConfigError::Invalid { field: "version".into(), reason: "must not be empty".into() });
        }
        if self.cache_prefix.is_empty() {
            return Err(ConfigError::Invalid { field: "cache_prefix".into(), reason: "must not be empty".into() });
        }
        // activation only evicts prefixed caches, so our own names must carry the prefix
        if !self.version.starts_with(&self.cache_prefix) {
            return Err(ConfigError::Invalid {
                field: "version".into(),
                reason: format!("must start with cache_prefix '{}'", self.cache_prefix),
            });
        }

        match Url::parse(&self.origin) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {}
            _ => {
                return Err(ConfigError::Invalid {
                    field: "origin".into(),
                    reason: "must be an absolute http(s) URL".into(),
                });
            }
        }

        if self.retry_attempts == 0 || self.retry_attempts > 10 {
            return Err(ConfigError::Invalid { field: "retry_attempts".into(), reason: "must be between 1 and 10".into() });
        }
        if self.retry_delays_ms.len() + 1 < self.retry_attempts as usize {
            return Err(ConfigError::Invalid {
                field: "retry_delays_ms".into(),
                reason: format!("needs at least {} entries", self.retry_attempts - 1),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 100 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 100MB".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.seed_assets.is_empty() {
            tracing::warn!("seed_assets is empty; install will only cache discovered assets");
        }

        Ok(())
    }
}
