//! # Portal Core Storage System
//!
//! Persistence for the rows the core owns or reads, plus application
//! configuration.
//!
//! ## Key Components:
//!
//! - **[`Store`](provider::Store)**: async collaborator trait over the plugin
//!   registry, catalog, orders, order configuration and invoices. Booleans are
//!   real `bool`s and statuses are enums.
//! - **[`MemoryStore`](memory::MemoryStore)**: the in-process implementation,
//!   persisted as a JSON snapshot through an atomic temp-file write.
//! - **Models** (`models`): row types and insert payloads.
//! - **Configuration** (`config`): [`PortalConfig`](config::PortalConfig) loaded
//!   from JSON, YAML or TOML depending on the file extension and enabled features.
//! - **Error Handling** (`error`): [`StorageSystemError`](error::StorageSystemError).
pub mod config;
pub mod error;
pub mod local;
pub mod memory;
pub mod models;
pub mod provider;

pub use config::{ConfigFormat, PortalConfig, WorkerConfig};
pub use error::StorageSystemError;
pub use memory::{MemoryStore, TableCounts};
pub use models::*;
pub use provider::{StorageResult, Store};

// Test module declaration
#[cfg(test)]
mod tests;
