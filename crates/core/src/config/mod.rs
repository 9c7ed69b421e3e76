//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Configuration is loaded once at startup. The version stamp and seed list
//! are fixed for the lifetime of a deployment.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::worker::WorkerConfig;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version stamp naming the current cache store.
    ///
    /// Set via SWCACHE_CACHE_VERSION environment variable. Changing it
    /// makes every other store stale on the next activation.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Resources cached at install time, resolved against `origin`.
    ///
    /// Set via SWCACHE_SEED_RESOURCES (e.g. `'["/", "index.html"]'`).
    #[serde(default = "default_seed_resources")]
    pub seed_resources: Vec<String>,

    /// Origin of the application being served.
    ///
    /// Set via SWCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SWCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via SWCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SWCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Cached page served when a navigation misses the cache and the network fails.
    ///
    /// Set via SWCACHE_OFFLINE_PAGE environment variable. Unset by default,
    /// in which case no response is produced.
    #[serde(default)]
    pub offline_page: Option<String>,
}

fn default_cache_version() -> String {
    "fases-app-cache-v1.2".into()
}

fn default_seed_resources() -> Vec<String> {
    vec!["/".into(), "index.html".into()]
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            seed_resources: default_seed_resources(),
            origin: default_origin(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            offline_page: None,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parsed application origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: format!("unsupported scheme: {scheme}"),
            }),
        }
    }

    /// Worker configuration with seed resources resolved against the origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin or any resource cannot be resolved.
    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        let origin = self.origin_url()?;
        let resolve = |field: &str, resource: &str| {
            origin.join(resource).map_err(|e| ConfigError::Invalid {
                field: field.into(),
                reason: format!("{resource}: {e}"),
            })
        };

        let seed_resources = self
            .seed_resources
            .iter()
            .map(|r| resolve("seed_resources", r))
            .collect::<Result<Vec<_>, _>>()?;
        let offline_page = self
            .offline_page
            .as_deref()
            .map(|p| resolve("offline_page", p))
            .transpose()?;

        Ok(WorkerConfig { cache_name: self.cache_version.clone(), seed_resources, offline_page })
    }
}
