//! # Portal Core Plugin System
//!
//! Discovers plugins on disk, decides which ones are admitted, and exposes
//! their capabilities to the rest of the core.
//!
//! ## Key Components & Concepts:
//!
//! - **Descriptor** (`manifest`): [`PluginDescriptor`] parsed from each plugin's
//!   `plugin.json`, checked by [`DescriptorValidator`].
//! - **Dependency checkers** (`dependency`): internal-plugin, installed-package
//!   and runtime-version predicates gating admission.
//! - **Loader** (`loader`): [`PluginLoader`] scans the plugins directory,
//!   deduplicates identifiers, retries plugins waiting on other plugins, and
//!   upserts a registry row for every admission.
//! - **Catalog & registry** (`catalog`, `registry`): compiled-in plugin
//!   factories, and the in-process set of admitted plugins with their
//!   provider factories and deployable flags.
//! - **Capability resolver** (`resolver`): [`CapabilityResolver`] maps an
//!   identifier to a live [`Provider`].
//! - **Error Handling** (`error`): [`PluginSystemError`](error::PluginSystemError).
pub mod catalog;
pub mod dependency;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod traits;
pub mod version;

pub use catalog::{PluginCatalog, PluginFactory};
pub use dependency::{DependencyChecker, DependencyCheckers, DependencySpec, PackageChecker, RuntimeVersionChecker};
pub use error::PluginSystemError;
pub use loader::{LoadReport, PluginLoader, Rejection};
pub use manifest::{DescriptorBuilder, DescriptorValidator, PluginDescriptor, PluginType};
pub use provider::{DeployError, DeploymentReceipt, DeploymentRequest, FieldSpec, FieldSpecMap, FieldType, Provider};
pub use registry::{PluginRegistry, SharedPluginRegistry};
pub use resolver::CapabilityResolver;
pub use traits::Plugin;

// Test module declaration
#[cfg(test)]
mod tests;
