//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CYFT_SW_*)
//! 2. TOML config file (if CYFT_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::policy::{CacheNames, RetryPolicy};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CYFT_SW_*)
/// 2. TOML config file (if CYFT_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Build version; cache names are derived from it.
    ///
    /// Set via CYFT_SW_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Prefix shared by every cache this product owns.
    ///
    /// Set via CYFT_SW_CACHE_PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Origin the controller serves; other origins pass through.
    ///
    /// Set via CYFT_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to SQLite cache storage.
    ///
    /// Set via CYFT_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for upstream requests.
    ///
    /// Set via CYFT_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to accept per upstream response.
    ///
    /// Set via CYFT_SW_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Maximum redirects followed per fetch.
    ///
    /// Set via CYFT_SW_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Total fetch attempts per request.
    ///
    /// Set via CYFT_SW_RETRY_ATTEMPTS environment variable.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay after each failed attempt, indexed by attempt number.
    ///
    /// Set via CYFT_SW_RETRY_DELAYS_MS environment variable (e.g. `[1000,2000,4000]`).
    #[serde(default = "default_retry_delays_ms")]
    pub retry_delays_ms: Vec<u64>,

    /// Per-attempt timeout in milliseconds.
    ///
    /// Set via CYFT_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Assets always pre-cached on install, before discovery.
    ///
    /// Set via CYFT_SW_SEED_ASSETS environment variable.
    #[serde(default = "default_seed_assets")]
    pub seed_assets: Vec<String>,
}

fn default_version() -> String {
    "cyft-v3-chrome-fix".into()
}

fn default_cache_prefix() -> String {
    "cyft-".into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./cyft-sw-cache.sqlite")
}

fn default_user_agent() -> String {
    "cyft-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    20_971_520 // 20MB
}

fn default_max_redirects() -> usize {
    5
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delays_ms() -> Vec<u64> {
    vec![1000, 2000, 4000]
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_seed_assets() -> Vec<String> {
    vec!["/".into(), "/index.html".into(), "/favicon.svg".into()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            cache_prefix: default_cache_prefix(),
            origin: default_origin(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            max_redirects: default_max_redirects(),
            retry_attempts: default_retry_attempts(),
            retry_delays_ms: default_retry_delays_ms(),
            timeout_ms: default_timeout_ms(),
            seed_assets: default_seed_assets(),
        }
    }
}

impl AppConfig {
    /// Per-attempt timeout as Duration for use with tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            self.retry_delays_ms.iter().copied().map(Duration::from_millis).collect(),
            self.timeout(),
        )
    }

    pub fn cache_names(&self) -> CacheNames {
        CacheNames::new(self.version.clone())
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CYFT_SW_`
    /// 2. TOML file from `CYFT_SW_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("CYFT_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CYFT_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
