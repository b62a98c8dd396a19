//! # Portal Core
//!
//! Plugin loading, the in-process event bus, provider resolution and the
//! order fulfillment pipeline shared by the `portal` binary and its plugins.

pub mod event;
pub mod kernel;
pub mod orders;
pub mod plugin_system;
pub mod storage;
pub mod worker;

// Re-export key public types/traits for the binary and plugin crates
pub use event::{EventBus, SystemEvent};
pub use kernel::Application;
pub use kernel::error::{Error as KernelError, Result};
pub use orders::{OrderError, OrderManager, OrderStatus, InvoiceStatus};
pub use plugin_system::{
    CapabilityResolver, DeployError, DeploymentReceipt, DeploymentRequest, FieldSpec,
    FieldSpecMap, FieldType, Plugin, PluginCatalog, PluginDescriptor, PluginLoader, Provider,
};
pub use storage::{MemoryStore, PortalConfig, Store};
pub use worker::{CronJob, FulfillmentWorker, Interval, TickReport};

#[cfg(test)]
mod tests;
