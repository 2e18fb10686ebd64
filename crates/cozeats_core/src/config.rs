//! Configuration system for the CozEats client
//!
//! Settings are read from TOML. Anything not set falls back to defaults that
//! point at the hosted backend.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    error::{ConfigError, CoreError},
    store::FileStore,
    theme::ThemeOption,
};

/// Hosted backend used when nothing else is configured
pub const DEFAULT_API_URL: &str = "https://coz-eats-server.vercel.app";

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "COZEATS_API_URL";

/// Resolve a path relative to a base directory
/// If the path is absolute, return it as-is
fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CozeatsConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub theme: ThemeConfig,
}

/// Remote backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Local storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage file; defaults to the platform data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Selection sync settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Whether focused screens re-read the stored selection on an interval,
    /// to pick up switches made by another process sharing the storage file
    #[serde(default = "default_poll_external")]
    pub poll_external: bool,

    /// Interval between re-reads, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Preference used until the user picks one
    #[serde(default)]
    pub default: ThemeOption,
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_external() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_external: default_poll_external(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ApiConfig {
    /// Per-request timeout, or `None` when `timeout_secs` is 0
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl SyncConfig {
    /// Poll interval for focused screens, or `None` when polling is off
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_external && self.poll_interval_ms > 0)
            .then(|| Duration::from_millis(self.poll_interval_ms))
    }
}

impl StorageConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(FileStore::default_path)
    }
}

impl CozeatsConfig {
    /// Apply `COZEATS_API_URL` if it is set and non-empty
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
    }

    /// Load configuration from standard locations
    pub async fn load() -> Result<Self> {
        load_config_from_standard_locations().await
    }

    /// Load configuration from a specific file
    pub async fn load_from(path: &Path) -> Result<Self> {
        load_config(path).await
    }

    /// Save configuration to a specific file
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        save_config(self, path).await
    }
}

/// Load configuration from a TOML file
pub async fn load_config(path: &Path) -> Result<CozeatsConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "readable TOML file".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })?;

    let mut config: CozeatsConfig =
        toml::from_str(&content).map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "content".to_string(),
            expected: "valid TOML configuration".to_string(),
            cause: ConfigError::TomlParse(e.to_string()),
        })?;

    // Resolve the storage path relative to the config file's directory
    let base_dir = path.parent().unwrap_or(Path::new("."));
    if let Some(storage_path) = &config.storage.path {
        config.storage.path = Some(resolve_path(base_dir, storage_path));
    }

    config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();

    Ok(config)
}

/// Save configuration to a TOML file
pub async fn save_config(config: &CozeatsConfig, path: &Path) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::ConfigurationError {
                    config_path: parent.display().to_string(),
                    field: "directory".to_string(),
                    expected: "writable directory".to_string(),
                    cause: ConfigError::Io(e.to_string()),
                })?;
        }
    }

    let content = toml::to_string_pretty(config).map_err(|e| CoreError::ConfigurationError {
        config_path: path.display().to_string(),
        field: "serialization".to_string(),
        expected: "serializable config structure".to_string(),
        cause: ConfigError::TomlSerialize(e.to_string()),
    })?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "writable file location".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })?;

    Ok(())
}

/// Standard config file locations
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // Project-specific config
    paths.push(PathBuf::from("cozeats.toml"));

    // User config directory
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("cozeats").join("config.toml"));
    }

    // Home directory fallback
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".cozeats").join("config.toml"));
    }

    paths
}

/// Load configuration from standard locations
pub async fn load_config_from_standard_locations() -> Result<CozeatsConfig> {
    for path in config_paths() {
        if path.exists() {
            return load_config(&path).await;
        }
    }

    // No config found, return default
    Ok(CozeatsConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = CozeatsConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.sync.poll_interval(), Some(Duration::from_secs(1)));
        assert_eq!(config.api.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.theme.default, ThemeOption::System);
    }

    #[test]
    fn test_zero_timeout_means_no_timeout() {
        let config: CozeatsConfig = toml::from_str("[api]\ntimeout_secs = 0\n").unwrap();
        assert_eq!(config.api.timeout(), None);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: CozeatsConfig = toml::from_str(
            r#"
            [api]
            base_url = "http://localhost:8000"

            [sync]
            poll_external = false
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.sync.poll_interval(), None);
    }

    #[tokio::test]
    async fn test_save_and_load_resolves_storage_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("cozeats.toml");

        let mut config = CozeatsConfig::default();
        config.api.base_url = "http://localhost:8000/".to_string();
        config.storage.path = Some(PathBuf::from("state/storage.json"));
        config.save_to(&path).await.unwrap();

        let loaded = CozeatsConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded.api.base_url, "http://localhost:8000");
        assert_eq!(
            loaded.storage.path,
            Some(dir.path().join("conf").join("state/storage.json"))
        );
    }

    #[tokio::test]
    async fn test_invalid_toml_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cozeats.toml");
        tokio::fs::write(&path, "[api\nbase_url = 1").await.unwrap();

        let err = CozeatsConfig::load_from(&path).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::ConfigurationError {
                cause: ConfigError::TomlParse(_),
                ..
            }
        ));
    }
}
