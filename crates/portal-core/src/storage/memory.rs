use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::orders::state::{InvoiceStatus, OrderStatus};
use crate::plugin_system::manifest::PluginType;
use crate::storage::error::StorageSystemError;
use crate::storage::local::{read_optional, write_atomic};
use crate::storage::models::{
    Category, Invoice, NewCategory, NewInvoice, NewOrder, NewOrderConfig, NewService, Order,
    OrderBundle, OrderConfigEntry, RegistryEntry, RegistryFlags, RowId, Service,
};
use crate::storage::provider::{StorageResult, Store};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Sequences {
    registry: RowId,
    categories: RowId,
    services: RowId,
    orders: RowId,
    order_config: RowId,
    invoices: RowId,
}

fn next_id(seq: &mut RowId) -> RowId {
    *seq += 1;
    *seq
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Tables {
    sequences: Sequences,
    registry: Vec<RegistryEntry>,
    categories: Vec<Category>,
    services: Vec<Service>,
    orders: Vec<Order>,
    order_config: Vec<OrderConfigEntry>,
    invoices: Vec<Invoice>,
}

/// Row counts per table, tombstones included.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub registry: usize,
    pub categories: usize,
    pub services: usize,
    pub orders: usize,
    pub order_config: usize,
    pub invoices: usize,
}

/// In-process [`Store`] with optional JSON snapshot persistence.
///
/// All tables sit behind one async mutex, which is what makes
/// `create_order_bundle` atomic and `transition_order` a true compare-and-set.
#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    snapshot_path: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store without a snapshot file.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            snapshot_path: None,
        }
    }

    /// Load the snapshot at `path` (empty when missing) and remember it for
    /// [`save_snapshot`](Self::save_snapshot).
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let tables = match read_optional(&path)? {
            Some(bytes) if !bytes.is_empty() => serde_json::from_slice::<Tables>(&bytes).map_err(|e| {
                StorageSystemError::DeserializationError {
                    format: "JSON".to_string(),
                    source: Box::new(e),
                }
            })?,
            _ => Tables::default(),
        };
        log::debug!("[MemoryStore] Opened snapshot {}", path.display());
        Ok(Self {
            tables: Mutex::new(tables),
            snapshot_path: Some(path),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Write the current tables to the snapshot file. No-op for stores
    /// created with [`new`](Self::new).
    pub async fn save_snapshot(&self) -> StorageResult<()> {
        match &self.snapshot_path {
            Some(path) => self.save_snapshot_to(path).await,
            None => Ok(()),
        }
    }

    pub async fn save_snapshot_to(&self, path: &Path) -> StorageResult<()> {
        let bytes = {
            let tables = self.tables.lock().await;
            serde_json::to_vec_pretty(&*tables).map_err(|e| StorageSystemError::SerializationError {
                format: "JSON".to_string(),
                source: Box::new(e),
            })?
        };
        write_atomic(path, &bytes)?;
        log::debug!("[MemoryStore] Saved snapshot to {}", path.display());
        Ok(())
    }

    pub async fn counts(&self) -> TableCounts {
        let tables = self.tables.lock().await;
        TableCounts {
            registry: tables.registry.len(),
            categories: tables.categories.len(),
            services: tables.services.len(),
            orders: tables.orders.len(),
            order_config: tables.order_config.len(),
            invoices: tables.invoices.len(),
        }
    }

    /// Soft-delete an order and its config rows and invoice.
    pub async fn soft_delete_order(&self, id: RowId) -> StorageResult<()> {
        let mut tables = self.tables.lock().await;
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id == id && !o.deleted)
            .ok_or_else(|| StorageSystemError::not_found("order", id))?;
        order.deleted = true;
        tables
            .order_config
            .iter_mut()
            .filter(|c| c.order == id)
            .for_each(|c| c.deleted = true);
        tables
            .invoices
            .iter_mut()
            .filter(|i| i.order == id)
            .for_each(|i| i.deleted = true);
        Ok(())
    }
}

impl Tables {
    fn live_registry(&self, id: RowId) -> Option<&RegistryEntry> {
        self.registry.iter().find(|e| e.id == id && !e.deleted)
    }

    fn live_service(&self, id: RowId) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id && !s.deleted)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upsert_registry_entry(&self, name: &str, kind: PluginType) -> StorageResult<RegistryEntry> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        if let Some(entry) = tables.registry.iter_mut().find(|e| e.name == name) {
            entry.kind = kind;
            entry.date = now;
            return Ok(entry.clone());
        }
        let entry = RegistryEntry {
            id: next_id(&mut tables.sequences.registry),
            name: name.to_string(),
            kind,
            enabled: true,
            locked: false,
            deleted: false,
            date: now,
        };
        tables.registry.push(entry.clone());
        Ok(entry)
    }

    async fn registry_entry(&self, name: &str) -> StorageResult<Option<RegistryEntry>> {
        let tables = self.tables.lock().await;
        Ok(tables.registry.iter().find(|e| e.name == name).cloned())
    }

    async fn registry_entry_by_id(&self, id: RowId) -> StorageResult<Option<RegistryEntry>> {
        let tables = self.tables.lock().await;
        Ok(tables.live_registry(id).cloned())
    }

    async fn registry_entries(&self) -> StorageResult<Vec<RegistryEntry>> {
        let tables = self.tables.lock().await;
        Ok(tables.registry.clone())
    }

    async fn update_registry_flags(&self, name: &str, flags: RegistryFlags) -> StorageResult<RegistryEntry> {
        let mut tables = self.tables.lock().await;
        let entry = tables
            .registry
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| StorageSystemError::not_found("registry entry", name))?;

        let touches_other_flags = flags.enabled.is_some() || flags.deleted.is_some();
        if entry.locked && flags.locked != Some(false) && touches_other_flags {
            return Err(StorageSystemError::Locked(name.to_string()));
        }

        if let Some(locked) = flags.locked {
            entry.locked = locked;
        }
        if let Some(enabled) = flags.enabled {
            entry.enabled = enabled;
        }
        if let Some(deleted) = flags.deleted {
            entry.deleted = deleted;
        }
        entry.date = Utc::now();
        Ok(entry.clone())
    }

    async fn insert_category(&self, category: NewCategory) -> StorageResult<Category> {
        let mut tables = self.tables.lock().await;
        if tables.categories.iter().any(|c| c.uri == category.uri && !c.deleted) {
            return Err(StorageSystemError::Constraint(format!(
                "category uri '{}' already exists",
                category.uri
            )));
        }
        let row = Category {
            id: next_id(&mut tables.sequences.categories),
            uri: category.uri,
            name: category.name,
            deleted: false,
        };
        tables.categories.push(row.clone());
        Ok(row)
    }

    async fn category_by_uri(&self, uri: &str) -> StorageResult<Option<Category>> {
        let tables = self.tables.lock().await;
        Ok(tables.categories.iter().find(|c| c.uri == uri && !c.deleted).cloned())
    }

    async fn category(&self, id: RowId) -> StorageResult<Option<Category>> {
        let tables = self.tables.lock().await;
        Ok(tables.categories.iter().find(|c| c.id == id && !c.deleted).cloned())
    }

    async fn insert_service(&self, service: NewService) -> StorageResult<Service> {
        let mut tables = self.tables.lock().await;
        if tables.services.iter().any(|s| s.uri == service.uri && !s.deleted) {
            return Err(StorageSystemError::Constraint(format!(
                "service uri '{}' already exists",
                service.uri
            )));
        }
        if !tables.categories.iter().any(|c| c.id == service.category && !c.deleted) {
            return Err(StorageSystemError::Constraint(format!(
                "category {} does not exist",
                service.category
            )));
        }
        if tables.live_registry(service.provider).is_none() {
            return Err(StorageSystemError::Constraint(format!(
                "registry entry {} does not exist",
                service.provider
            )));
        }
        let row = Service {
            id: next_id(&mut tables.sequences.services),
            uri: service.uri,
            name: service.name,
            category: service.category,
            provider: service.provider,
            period_days: service.period_days,
            deleted: false,
        };
        tables.services.push(row.clone());
        Ok(row)
    }

    async fn service_by_uri(&self, uri: &str) -> StorageResult<Option<Service>> {
        let tables = self.tables.lock().await;
        Ok(tables.services.iter().find(|s| s.uri == uri && !s.deleted).cloned())
    }

    async fn service(&self, id: RowId) -> StorageResult<Option<Service>> {
        let tables = self.tables.lock().await;
        Ok(tables.live_service(id).cloned())
    }

    async fn create_order_bundle(
        &self,
        order: NewOrder,
        config: Vec<NewOrderConfig>,
        invoice: NewInvoice,
    ) -> StorageResult<OrderBundle> {
        let mut tables = self.tables.lock().await;

        // Validate everything before the first push; nothing below can fail.
        if tables.live_service(order.service).is_none() {
            return Err(StorageSystemError::Constraint(format!(
                "service {} does not exist",
                order.service
            )));
        }
        if tables.live_registry(order.provider).is_none() {
            return Err(StorageSystemError::Constraint(format!(
                "registry entry {} does not exist",
                order.provider
            )));
        }
        let mut keys = HashSet::new();
        for entry in &config {
            if entry.key.trim().is_empty() {
                return Err(StorageSystemError::Constraint("config key is empty".to_string()));
            }
            if !keys.insert(entry.key.as_str()) {
                return Err(StorageSystemError::Constraint(format!(
                    "duplicate config key '{}'",
                    entry.key
                )));
            }
        }

        let now = Utc::now();
        let order_row = Order {
            id: next_id(&mut tables.sequences.orders),
            user: order.user,
            service: order.service,
            provider: order.provider,
            status: OrderStatus::default(),
            days_left: order.days_left,
            deleted: false,
            date: now,
        };

        let mut config_rows = Vec::with_capacity(config.len());
        for entry in config {
            config_rows.push(OrderConfigEntry {
                id: next_id(&mut tables.sequences.order_config),
                order: order_row.id,
                key: entry.key,
                value: entry.value,
                deleted: false,
            });
        }

        let invoice_row = Invoice {
            id: next_id(&mut tables.sequences.invoices),
            user: order.user,
            order: order_row.id,
            payment_gateway: invoice.payment_gateway,
            status: InvoiceStatus::default(),
            due_date: invoice.due_date,
            paid_at: None,
            cancelled_at: None,
            refunded_at: None,
            deleted: false,
        };

        tables.orders.push(order_row.clone());
        tables.order_config.extend(config_rows.iter().cloned());
        tables.invoices.push(invoice_row.clone());

        Ok(OrderBundle {
            order: order_row,
            config: config_rows,
            invoice: invoice_row,
        })
    }

    async fn order(&self, id: RowId) -> StorageResult<Option<Order>> {
        let tables = self.tables.lock().await;
        Ok(tables.orders.iter().find(|o| o.id == id && !o.deleted).cloned())
    }

    async fn orders_with_status(&self, status: OrderStatus) -> StorageResult<Vec<Order>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .orders
            .iter()
            .filter(|o| o.status == status && !o.deleted)
            .cloned()
            .collect())
    }

    async fn transition_order(&self, id: RowId, from: OrderStatus, to: OrderStatus) -> StorageResult<Order> {
        from.transition(to)?;
        let mut tables = self.tables.lock().await;
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id == id && !o.deleted)
            .ok_or_else(|| StorageSystemError::not_found("order", id))?;
        if order.status != from {
            return Err(StorageSystemError::StaleStatus {
                order_id: id,
                expected: from,
                actual: order.status,
            });
        }
        order.status = to;
        Ok(order.clone())
    }

    async fn order_config(&self, order: RowId) -> StorageResult<Vec<OrderConfigEntry>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .order_config
            .iter()
            .filter(|c| c.order == order && !c.deleted)
            .cloned()
            .collect())
    }

    async fn invoice(&self, id: RowId) -> StorageResult<Option<Invoice>> {
        let tables = self.tables.lock().await;
        Ok(tables.invoices.iter().find(|i| i.id == id && !i.deleted).cloned())
    }

    async fn invoice_for_order(&self, order: RowId) -> StorageResult<Option<Invoice>> {
        let tables = self.tables.lock().await;
        Ok(tables.invoices.iter().find(|i| i.order == order && !i.deleted).cloned())
    }

    async fn settle_invoice(&self, id: RowId, status: InvoiceStatus, at: DateTime<Utc>) -> StorageResult<Invoice> {
        let mut tables = self.tables.lock().await;
        let invoice = tables
            .invoices
            .iter_mut()
            .find(|i| i.id == id && !i.deleted)
            .ok_or_else(|| StorageSystemError::not_found("invoice", id))?;
        invoice.status = invoice.status.transition(status)?;
        match status {
            InvoiceStatus::Paid => invoice.paid_at = Some(at),
            InvoiceStatus::Cancelled => invoice.cancelled_at = Some(at),
            InvoiceStatus::Refunded => invoice.refunded_at = Some(at),
            InvoiceStatus::Pending => {}
        }
        Ok(invoice.clone())
    }
}
