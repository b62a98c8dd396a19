use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};

use crate::event::{EventBus, SystemEvent};
use crate::orders::error::OrderError;
use crate::orders::state::{InvoiceStatus, OrderStatus};
use crate::plugin_system::registry::SharedPluginRegistry;
use crate::plugin_system::resolver::CapabilityResolver;
use crate::storage::models::{
    Category, Invoice, NewInvoice, NewOrder, NewOrderConfig, Order, OrderConfigEntry, RowId, Service,
};
use crate::storage::{StorageSystemError, Store};

/// Field values submitted with an order. `None` is an explicit null and is
/// not persisted.
pub type SubmittedFields = BTreeMap<String, Option<String>>;

/// An order with the rows around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    pub order: Order,
    pub service: Service,
    pub category: Option<Category>,
    /// Provider plugin identifier.
    pub provider: String,
    pub invoice: Option<Invoice>,
    pub config: Vec<OrderConfigEntry>,
}

/// Creates orders and settles their invoices.
#[derive(Clone)]
pub struct OrderManager {
    store: Arc<dyn Store>,
    registry: SharedPluginRegistry,
    resolver: CapabilityResolver,
    bus: EventBus,
    default_gateway: String,
    invoice_due: TimeDelta,
}

impl OrderManager {
    pub fn new(
        store: Arc<dyn Store>,
        registry: SharedPluginRegistry,
        resolver: CapabilityResolver,
        bus: EventBus,
        default_gateway: impl Into<String>,
        invoice_due_days: i64,
    ) -> Self {
        let invoice_due = TimeDelta::try_days(invoice_due_days).unwrap_or_else(|| {
            log::warn!("[OrderManager] invoice_due_days {} out of range, using 0", invoice_due_days);
            TimeDelta::zero()
        });
        Self {
            store,
            registry,
            resolver,
            bus,
            default_gateway: default_gateway.into(),
            invoice_due,
        }
    }

    /// Validate a submission against the provider's field contract and
    /// persist the order, its config rows and its invoice.
    ///
    /// Every check runs before the first write, and the three writes are one
    /// atomic bundle, so a failure leaves no rows behind.
    pub async fn create_order(
        &self,
        user: RowId,
        category_uri: &str,
        service_uri: &str,
        submitted: &SubmittedFields,
    ) -> Result<OrderDetails, OrderError> {
        let service = self
            .store
            .service_by_uri(service_uri)
            .await?
            .ok_or_else(|| OrderError::ServiceNotFound(service_uri.to_string()))?;

        let category = self
            .store
            .category_by_uri(category_uri)
            .await?
            .ok_or_else(|| OrderError::CategoryNotFound(category_uri.to_string()))?;
        if service.category != category.id {
            return Err(OrderError::ServiceNotFound(service_uri.to_string()));
        }

        let provider = self.loaded_provider(&service).await?;

        let requirements = self
            .resolver
            .order_requirements(&provider)
            .await
            .ok_or_else(|| OrderError::ProviderNotFound(service_uri.to_string()))?;

        for key in requirements.required() {
            let present = submitted
                .get(key)
                .and_then(Option::as_deref)
                .is_some_and(|value| !value.trim().is_empty());
            if !present {
                log::info!("[OrderManager] Order for '{}' rejected: missing '{}'", service_uri, key);
                return Err(OrderError::MissingRequiredField(key.to_string()));
            }
        }

        let config = submitted
            .iter()
            .filter_map(|(key, value)| {
                value.as_ref().map(|value| NewOrderConfig {
                    key: key.clone(),
                    value: value.clone(),
                })
            })
            .collect();

        let bundle = self
            .store
            .create_order_bundle(
                NewOrder {
                    user,
                    service: service.id,
                    provider: service.provider,
                    days_left: service.period_days,
                },
                config,
                NewInvoice {
                    payment_gateway: self.default_gateway.clone(),
                    due_date: Utc::now() + self.invoice_due,
                },
            )
            .await?;

        log::info!(
            "[OrderManager] Created order {} for user {} (service '{}', provider '{}', {} config rows)",
            bundle.order.id,
            user,
            service.uri,
            provider,
            bundle.config.len()
        );
        self.bus.emit_event(&SystemEvent::OrderStatusChanged {
            order_id: bundle.order.id,
            provider: provider.clone(),
            status: bundle.order.status,
        });

        Ok(OrderDetails {
            order: bundle.order,
            service,
            category: Some(category),
            provider,
            invoice: Some(bundle.invoice),
            config: bundle.config,
        })
    }

    /// Move an invoice to `status`, stamping the matching timestamp. Paying
    /// also moves the order from `processing` to `processed`, which hands it
    /// to the fulfillment worker.
    pub async fn settle_invoice(&self, invoice_id: RowId, status: InvoiceStatus) -> Result<Invoice, OrderError> {
        if self.store.invoice(invoice_id).await?.is_none() {
            return Err(OrderError::InvoiceNotFound(invoice_id));
        }

        let invoice = self.store.settle_invoice(invoice_id, status, Utc::now()).await?;
        log::info!("[OrderManager] Invoice {} is now {}", invoice.id, invoice.status);
        self.bus.emit_event(&SystemEvent::InvoiceSettled {
            invoice_id: invoice.id,
            order_id: invoice.order,
            status: invoice.status,
        });

        if status == InvoiceStatus::Paid {
            self.mark_processed(invoice.order).await?;
        }
        Ok(invoice)
    }

    /// `processing` to `processed`. An order that already moved on is left alone.
    pub async fn mark_processed(&self, order_id: RowId) -> Result<Option<Order>, OrderError> {
        match self
            .store
            .transition_order(order_id, OrderStatus::Processing, OrderStatus::Processed)
            .await
        {
            Ok(order) => {
                let provider = self.provider_identifier(order.provider).await?;
                self.bus.emit_event(&SystemEvent::OrderStatusChanged {
                    order_id: order.id,
                    provider,
                    status: order.status,
                });
                Ok(Some(order))
            }
            Err(StorageSystemError::StaleStatus { actual, .. }) => {
                log::warn!("[OrderManager] Order {} is already {}, not marking processed", order_id, actual);
                Ok(None)
            }
            Err(StorageSystemError::NotFound { .. }) => Err(OrderError::OrderNotFound(order_id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn order_details(&self, order_id: RowId) -> Result<OrderDetails, OrderError> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        let service = self
            .store
            .service(order.service)
            .await?
            .ok_or_else(|| OrderError::ServiceNotFound(order.service.to_string()))?;
        let category = self.store.category(service.category).await?;
        let provider = self.provider_identifier(order.provider).await?;
        let invoice = self.store.invoice_for_order(order.id).await?;
        let config = self.store.order_config(order.id).await?;
        Ok(OrderDetails {
            order,
            service,
            category,
            provider,
            invoice,
            config,
        })
    }

    /// Identifier of the service's provider, if that plugin is loaded.
    async fn loaded_provider(&self, service: &Service) -> Result<String, OrderError> {
        let entry = self
            .store
            .registry_entry_by_id(service.provider)
            .await?
            .ok_or_else(|| OrderError::ProviderNotFound(service.uri.clone()))?;
        if !self.registry.read().await.is_loaded(&entry.name) {
            log::info!("[OrderManager] Provider '{}' of '{}' is not loaded", entry.name, service.uri);
            return Err(OrderError::ProviderNotFound(service.uri.clone()));
        }
        Ok(entry.name)
    }

    async fn provider_identifier(&self, registry_id: RowId) -> Result<String, OrderError> {
        Ok(self
            .store
            .registry_entry_by_id(registry_id)
            .await?
            .map(|entry| entry.name)
            .unwrap_or_default())
    }
}
