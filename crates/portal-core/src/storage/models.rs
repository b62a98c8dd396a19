//! Rows persisted by the [`Store`](crate::storage::Store).
//!
//! Every row carries a real `deleted` flag; nothing in the normal flow removes
//! rows, and reads skip tombstoned ones.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::orders::state::{InvoiceStatus, OrderStatus};
use crate::plugin_system::manifest::PluginType;

/// Primary key of every table.
pub type RowId = i64;

/// Persisted state of an admitted plugin. Owned by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: RowId,
    /// Plugin identifier.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PluginType,
    pub enabled: bool,
    pub locked: bool,
    pub deleted: bool,
    /// Last modification.
    pub date: DateTime<Utc>,
}

/// Flag changes applied by `update_registry_flags`; `None` leaves a flag alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryFlags {
    pub enabled: Option<bool>,
    pub locked: Option<bool>,
    pub deleted: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: RowId,
    pub uri: String,
    pub name: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: RowId,
    pub uri: String,
    pub name: String,
    /// Owning category.
    pub category: RowId,
    /// Registry entry of the provider plugin fulfilling this service.
    pub provider: RowId,
    /// Billing period, copied into `Order::days_left`.
    pub period_days: i64,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: RowId,
    pub user: RowId,
    pub service: RowId,
    pub provider: RowId,
    pub status: OrderStatus,
    pub days_left: i64,
    pub deleted: bool,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfigEntry {
    pub id: RowId,
    pub order: RowId,
    pub key: String,
    pub value: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: RowId,
    pub user: RowId,
    pub order: RowId,
    pub payment_gateway: String,
    pub status: InvoiceStatus,
    pub due_date: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub deleted: bool,
}

impl Invoice {
    /// Timestamp matching the current status, if any.
    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            InvoiceStatus::Pending => None,
            InvoiceStatus::Paid => self.paid_at,
            InvoiceStatus::Cancelled => self.cancelled_at,
            InvoiceStatus::Refunded => self.refunded_at,
        }
    }
}

// --- Insert payloads ---

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub uri: String,
    pub name: String,
    pub category: RowId,
    pub provider: RowId,
    pub period_days: i64,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user: RowId,
    pub service: RowId,
    pub provider: RowId,
    pub days_left: i64,
}

#[derive(Debug, Clone)]
pub struct NewOrderConfig {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub payment_gateway: String,
    pub due_date: DateTime<Utc>,
}

/// Rows written together by `create_order_bundle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBundle {
    pub order: Order,
    pub config: Vec<OrderConfigEntry>,
    pub invoice: Invoice,
}

impl OrderBundle {
    /// Persisted configuration as a key/value map, as handed to providers.
    pub fn config_map(&self) -> BTreeMap<String, String> {
        config_map(&self.config)
    }
}

pub fn config_map(entries: &[OrderConfigEntry]) -> BTreeMap<String, String> {
    entries
        .iter()
        .filter(|entry| !entry.deleted)
        .map(|entry| (entry.key.clone(), entry.value.clone()))
        .collect()
}
