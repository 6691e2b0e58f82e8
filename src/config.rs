//! Configuration types for the reconciliation service.

use loc_suggest::{ReconcileConfig, ServiceInfo};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ServiceError;

/// Top-level configuration, usually loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Suggest endpoint, authority catalog and ranking constants.
    pub reconcile: ReconcileConfig,
    /// Cache for raw suggest2 hit lists.
    pub cache: CacheConfig,
    /// Fields advertised in the service metadata document.
    pub service: ServiceInfo,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port (0 = auto-assign).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 5000,
        }
    }
}

/// Hit cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether suggest2 responses are cached at all.
    pub enabled: bool,
    /// How long a cached hit list stays valid, in seconds.
    pub ttl_seconds: u64,
    /// Upper bound on cached hit lists.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3_600,
            max_entries: 1_000,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ServiceError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/loc-reconcile/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config)
                .join("loc-reconcile")
                .join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("loc-reconcile")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/loc-reconcile/config.toml")
        }
    }

    /// Check every section.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] for a blank host, a zero cache TTL
    /// or capacity while caching is enabled, or a view URL without `{{id}}`,
    /// and [`ServiceError::Reconcile`] for an invalid `[reconcile]` section.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(ServiceError::Config("server.host must not be empty".into()));
        }
        if self.cache.enabled && (self.cache.ttl_seconds == 0 || self.cache.max_entries == 0) {
            return Err(ServiceError::Config(
                "cache.ttl_seconds and cache.max_entries must be greater than 0 when the cache is enabled"
                    .into(),
            ));
        }
        if !self.service.view_url.contains("{{id}}") {
            return Err(ServiceError::Config(
                "service.view_url must contain the {{id}} placeholder".into(),
            ));
        }
        self.reconcile.validate()?;
        Ok(())
    }
}
