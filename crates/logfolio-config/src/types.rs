//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [server]
//! base_url = "http://127.0.0.1:8000"
//! api_path = "/api"
//! timeout_secs = 30
//!
//! [cache]
//! response_ttl_secs = 30
//! categories_ttl_secs = 300
//!
//! [retry]
//! max_retries = 2
//! backoff_ms = 300
//!
//! [search]
//! scroll_threshold = 120
//! default_type = "both"
//! source = "both"
//!
//! [export]
//! scale = 2.0
//! max_height = 16384
//! image_timeout_ms = 15000
//! filename_prefix = "achievement-wall"
//! background = "#0f0f1a"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g. project-local
/// overrides) can be loaded and merged. Use the accessor methods to read the
/// effective values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogfolioConfig {
    pub server: Option<ServerConfig>,
    pub cache: Option<CacheConfig>,
    pub retry: Option<RetryConfig>,
    pub search: Option<SearchConfig>,
    pub export: Option<ExportConfig>,
}

impl LogfolioConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: LogfolioConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.cache.is_some() {
            self.cache = other.cache;
        }
        if other.retry.is_some() {
            self.retry = other.retry;
        }
        if other.search.is_some() {
            self.search = other.search;
        }
        if other.export.is_some() {
            self.export = other.export;
        }
    }

    /// Effective server settings.
    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    /// Effective cache settings.
    pub fn cache(&self) -> CacheConfig {
        self.cache.clone().unwrap_or_default()
    }

    /// Effective retry settings.
    pub fn retry(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    /// Effective search settings.
    pub fn search(&self) -> SearchConfig {
        self.search.clone().unwrap_or_default()
    }

    /// Effective export settings.
    pub fn export(&self) -> ExportConfig {
        self.export.clone().unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        if let Some(server) = &self.server {
            if server.base_url.trim().is_empty() {
                return Err(invalid("server.base_url", "must not be empty"));
            }
            if !server.api_path.is_empty() && !server.api_path.starts_with('/') {
                return Err(invalid("server.api_path", "must start with '/'"));
            }
        }
        if let Some(export) = &self.export {
            if !(export.scale > 0.0) {
                return Err(invalid("export.scale", "must be positive"));
            }
            if export.max_height == 0 {
                return Err(invalid("export.max_height", "must be positive"));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Origin of the backend, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Path prefix every endpoint is joined onto.
    pub api_path: String,
    /// Upper bound for a single request attempt.
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            api_path: "/api".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Cache lifetimes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL of the generic GET response cache.
    pub response_ttl_secs: u64,
    /// TTL of the category list cache.
    pub categories_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            response_ttl_secs: 30,
            categories_ttl_secs: 300,
        }
    }
}

impl CacheConfig {
    pub fn response_ttl(&self) -> Duration {
        Duration::from_secs(self.response_ttl_secs)
    }

    pub fn categories_ttl(&self) -> Duration {
        Duration::from_secs(self.categories_ttl_secs)
    }
}

/// Retry policy for transport failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Linear backoff step; attempt `n` waits `n * backoff_ms`.
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_ms: 300,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Search session tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Remaining scroll distance (px) below which the next page loads.
    pub scroll_threshold: u32,
    /// Default media type filter (`both`, `anime`, `manga`, `game`).
    pub default_type: String,
    /// Upstream source selector passed to the search endpoint.
    pub source: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            scroll_threshold: 120,
            default_type: "both".to_string(),
            source: "both".to_string(),
        }
    }
}

/// Export pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Supersampling factor for the captured raster.
    pub scale: f32,
    /// Hard ceiling on output height in pixels.
    pub max_height: u32,
    /// Per-image load/fetch timeout during normalization.
    pub image_timeout_ms: u64,
    /// Download filename prefix; the date and extension are appended.
    pub filename_prefix: String,
    /// Background colour painted behind the capture.
    pub background: String,
    /// Directory file downloads are written to (CLI hosts only).
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            max_height: 16_384,
            image_timeout_ms: 15_000,
            filename_prefix: "achievement-wall".to_string(),
            background: "#0f0f1a".to_string(),
            output_dir: None,
        }
    }
}

impl ExportConfig {
    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
