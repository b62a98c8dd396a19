use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::kernel::constants;
use crate::storage::error::StorageSystemError;
use crate::storage::local::{read_optional, write_atomic};
use crate::storage::provider::StorageResult;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }

    fn label(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "JSON",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "YAML",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "TOML",
        }
    }

    fn deserialize(&self, contents: &str) -> StorageResult<PortalConfig> {
        let wrap = |source: Box<dyn std::error::Error + Send + Sync>| StorageSystemError::DeserializationError {
            format: self.label().to_string(),
            source,
        };
        match self {
            ConfigFormat::Json => serde_json::from_str(contents).map_err(|e| wrap(Box::new(e))),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(contents).map_err(|e| wrap(Box::new(e))),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(contents).map_err(|e| wrap(Box::new(e))),
        }
    }

    fn serialize(&self, config: &PortalConfig) -> StorageResult<String> {
        let wrap = |source: Box<dyn std::error::Error + Send + Sync>| StorageSystemError::SerializationError {
            format: self.label().to_string(),
            source,
        };
        match self {
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| wrap(Box::new(e))),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(config).map_err(|e| wrap(Box::new(e))),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| wrap(Box::new(e))),
        }
    }
}

/// Fulfillment job settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub job_id: String,
    /// `<n><unit>` with unit one of S, M, H, D, W.
    pub interval: String,
    pub deploy_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            job_id: constants::FULFILLMENT_JOB_ID.to_string(),
            interval: constants::FULFILLMENT_JOB_INTERVAL.to_string(),
            deploy_timeout_secs: constants::DEFAULT_DEPLOY_TIMEOUT_SECS,
        }
    }
}

/// Application configuration. Every field has a default, so a partial file
/// (or no file at all) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub plugins_dir: PathBuf,
    pub data_dir: PathBuf,
    /// Packages the `package:` dependency checker treats as installed.
    pub installed_packages: Vec<String>,
    pub default_gateway: String,
    /// Days between order creation and invoice due date.
    pub invoice_due_days: i64,
    pub worker: WorkerConfig,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            plugins_dir: PathBuf::from(constants::DEFAULT_PLUGINS_DIR),
            data_dir: PathBuf::from(constants::DEFAULT_DATA_DIR),
            installed_packages: Vec::new(),
            default_gateway: constants::DEFAULT_GATEWAY.to_string(),
            invoice_due_days: 0,
            worker: WorkerConfig::default(),
        }
    }
}

impl PortalConfig {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> StorageResult<Self> {
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| StorageSystemError::UnsupportedConfigFormat(path.display().to_string()))?;

        let Some(bytes) = read_optional(path)? else {
            log::info!("[Config] {} not found, using defaults", path.display());
            return Ok(Self::default());
        };

        let contents = String::from_utf8(bytes).map_err(|e| StorageSystemError::DeserializationError {
            format: format.label().to_string(),
            source: Box::new(e),
        })?;
        format.deserialize(&contents)
    }

    /// Write configuration to `path` in the format its extension names.
    pub fn save(&self, path: &Path) -> StorageResult<()> {
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| StorageSystemError::UnsupportedConfigFormat(path.display().to_string()))?;
        let contents = format.serialize(self)?;
        write_atomic(path, contents.as_bytes())
    }

    pub fn store_snapshot_path(&self) -> PathBuf {
        self.data_dir.join(constants::STORE_SNAPSHOT_FILE)
    }

    pub fn cron_marker_dir(&self) -> PathBuf {
        self.data_dir.join(constants::CRON_MARKER_DIR)
    }

    pub fn deploy_timeout(&self) -> Duration {
        Duration::from_secs(self.worker.deploy_timeout_secs)
    }
}
