//! # Portal Core Plugin System Errors
//!
//! [`PluginSystemError`] covers scanning the plugins directory, manifest
//! validation, dependency checks, duplicate identifiers and registration.
//! The loader turns most of these into per-plugin rejections rather than
//! returning them.
use std::path::PathBuf;

use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::manifest::DescriptorIssue;
use crate::plugin_system::version::VersionError;
use crate::storage::error::StorageSystemError;

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Cannot read plugins directory '{path}': {source}")]
    PluginsDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Plugin manifest error for '{path}': {message}")]
    ManifestError {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Plugin manifest '{0}' is empty")]
    EmptyManifest(PathBuf),

    #[error("Invalid plugin identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Invalid plugin manifest '{path}': {issue}")]
    InvalidDescriptor { path: PathBuf, issue: DescriptorIssue },

    #[error("Duplicate plugin identifier '{0}'")]
    DuplicateIdentifier(String),

    #[error("Plugin '{plugin_id}' has unmet dependencies: {}", .dependencies.join(", "))]
    DependencyUnmet {
        plugin_id: String,
        dependencies: Vec<String>,
    },

    #[error("Plugin '{plugin_id}' dependency declaration is invalid: {source}")]
    InvalidDependency {
        plugin_id: String,
        #[source]
        source: DependencyError,
    },

    #[error("Plugin '{0}' is disabled or deleted in the registry")]
    Disabled(String),

    #[error("Plugin registration error for '{plugin_id}': {message}")]
    RegistrationError { plugin_id: String, message: String },

    #[error("Version parsing error: {0}")]
    VersionParsing(#[from] VersionError),

    #[error("Registry storage error: {0}")]
    Storage(#[from] StorageSystemError),
}
