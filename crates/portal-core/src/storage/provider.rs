use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::orders::state::{InvoiceStatus, OrderStatus};
use crate::plugin_system::manifest::PluginType;
use crate::storage::error::StorageSystemError;
use crate::storage::models::{
    Category, Invoice, NewCategory, NewInvoice, NewOrder, NewOrderConfig, NewService, Order,
    OrderBundle, OrderConfigEntry, RegistryEntry, RegistryFlags, RowId, Service,
};

pub type StorageResult<T> = std::result::Result<T, StorageSystemError>;

/// Relational store collaborator.
///
/// Covers exactly the rows the core reads and writes. Implementations must
/// honour two guarantees the rest of the crate relies on:
///
/// - [`create_order_bundle`](Store::create_order_bundle) writes the order, its
///   config rows and its invoice as one unit, or nothing.
/// - [`transition_order`](Store::transition_order) is a compare-and-set on the
///   status column, so the worker and a user-facing writer cannot both move
///   the same order.
///
/// Reads never return soft-deleted rows.
#[async_trait]
pub trait Store: Send + Sync {
    /// Name of the backing implementation, for logs.
    fn name(&self) -> &str;

    // --- Plugin registry ---

    /// Insert or refresh an entry. A new entry is enabled, unlocked and live;
    /// an existing one keeps its flags and gets its type and date refreshed.
    async fn upsert_registry_entry(&self, name: &str, kind: PluginType) -> StorageResult<RegistryEntry>;

    /// Entry by plugin identifier, including tombstoned ones so the loader can
    /// honour a soft delete.
    async fn registry_entry(&self, name: &str) -> StorageResult<Option<RegistryEntry>>;

    async fn registry_entry_by_id(&self, id: RowId) -> StorageResult<Option<RegistryEntry>>;

    /// Every entry, ordered by id.
    async fn registry_entries(&self) -> StorageResult<Vec<RegistryEntry>>;

    /// Apply flag changes. Locked entries only accept a change to `locked` itself.
    async fn update_registry_flags(&self, name: &str, flags: RegistryFlags) -> StorageResult<RegistryEntry>;

    async fn set_enabled(&self, name: &str, enabled: bool) -> StorageResult<RegistryEntry> {
        let flags = RegistryFlags {
            enabled: Some(enabled),
            ..RegistryFlags::default()
        };
        self.update_registry_flags(name, flags).await
    }

    async fn set_locked(&self, name: &str, locked: bool) -> StorageResult<RegistryEntry> {
        let flags = RegistryFlags {
            locked: Some(locked),
            ..RegistryFlags::default()
        };
        self.update_registry_flags(name, flags).await
    }

    /// Tombstone an entry; the loader will skip the plugin from then on.
    async fn soft_delete(&self, name: &str) -> StorageResult<RegistryEntry> {
        let flags = RegistryFlags {
            deleted: Some(true),
            ..RegistryFlags::default()
        };
        self.update_registry_flags(name, flags).await
    }

    // --- Catalog ---

    async fn insert_category(&self, category: NewCategory) -> StorageResult<Category>;

    async fn category_by_uri(&self, uri: &str) -> StorageResult<Option<Category>>;

    async fn category(&self, id: RowId) -> StorageResult<Option<Category>>;

    async fn insert_service(&self, service: NewService) -> StorageResult<Service>;

    async fn service_by_uri(&self, uri: &str) -> StorageResult<Option<Service>>;

    async fn service(&self, id: RowId) -> StorageResult<Option<Service>>;

    // --- Orders ---

    async fn create_order_bundle(
        &self,
        order: NewOrder,
        config: Vec<NewOrderConfig>,
        invoice: NewInvoice,
    ) -> StorageResult<OrderBundle>;

    async fn order(&self, id: RowId) -> StorageResult<Option<Order>>;

    /// Orders currently in `status`, ordered by id.
    async fn orders_with_status(&self, status: OrderStatus) -> StorageResult<Vec<Order>>;

    /// Move an order from `from` to `to`, failing with `StaleStatus` when the
    /// row is no longer in `from` and with `InvalidTransition` when the edge
    /// does not exist.
    async fn transition_order(&self, id: RowId, from: OrderStatus, to: OrderStatus) -> StorageResult<Order>;

    async fn order_config(&self, order: RowId) -> StorageResult<Vec<OrderConfigEntry>>;

    // --- Invoices ---

    async fn invoice(&self, id: RowId) -> StorageResult<Option<Invoice>>;

    async fn invoice_for_order(&self, order: RowId) -> StorageResult<Option<Invoice>>;

    /// Move an invoice to `status` and stamp the matching timestamp with `at`.
    async fn settle_invoice(&self, id: RowId, status: InvoiceStatus, at: DateTime<Utc>) -> StorageResult<Invoice>;
}
