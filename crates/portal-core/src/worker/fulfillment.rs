use std::sync::Arc;
use std::time::Duration;

use crate::event::{EventBus, SystemEvent};
use crate::orders::state::OrderStatus;
use crate::plugin_system::provider::{DeployError, DeploymentReceipt, DeploymentRequest};
use crate::plugin_system::registry::SharedPluginRegistry;
use crate::plugin_system::resolver::CapabilityResolver;
use crate::storage::models::{Order, RowId, config_map};
use crate::storage::{StorageSystemError, Store};
use crate::worker::error::WorkerError;

/// Orders touched by one [`FulfillmentWorker::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub deployed: Vec<RowId>,
    pub failed: Vec<RowId>,
    /// Orders left alone: already claimed by another writer, or stuck in
    /// `deploying` from an earlier tick.
    pub skipped: Vec<RowId>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.deployed.is_empty() && self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Drives paid orders from `processed` to `deployed` or `failed`.
///
/// Orders are handled one at a time. Each is claimed with a compare-and-set
/// to `deploying` before its provider is called, so a second worker or a
/// concurrent writer cannot deploy it twice. A failed order stays failed.
#[derive(Clone)]
pub struct FulfillmentWorker {
    store: Arc<dyn Store>,
    registry: SharedPluginRegistry,
    resolver: CapabilityResolver,
    bus: EventBus,
    deploy_timeout: Duration,
}

impl FulfillmentWorker {
    pub fn new(
        store: Arc<dyn Store>,
        registry: SharedPluginRegistry,
        resolver: CapabilityResolver,
        bus: EventBus,
        deploy_timeout: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            resolver,
            bus,
            deploy_timeout,
        }
    }

    pub fn deploy_timeout(&self) -> Duration {
        self.deploy_timeout
    }

    /// One pass over every `processed` order.
    ///
    /// Only a failure to list orders is returned as an error; per-order
    /// failures end up in the report.
    pub async fn tick(&self) -> Result<TickReport, WorkerError> {
        let mut report = TickReport::default();

        for stuck in self.store.orders_with_status(OrderStatus::Deploying).await? {
            log::warn!(
                "[FulfillmentWorker] Order {} is still deploying from an earlier run, skipping. Manual intervention required",
                stuck.id
            );
            report.skipped.push(stuck.id);
        }

        let pending = self.store.orders_with_status(OrderStatus::Processed).await?;
        log::info!("[FulfillmentWorker] {} order(s) awaiting deployment", pending.len());

        for order in pending {
            self.process(order, &mut report).await;
        }

        log::info!(
            "[FulfillmentWorker] Tick done: {} deployed, {} failed, {} skipped",
            report.deployed.len(),
            report.failed.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    async fn process(&self, order: Order, report: &mut TickReport) {
        let order = match self
            .store
            .transition_order(order.id, OrderStatus::Processed, OrderStatus::Deploying)
            .await
        {
            Ok(order) => order,
            Err(StorageSystemError::StaleStatus { actual, .. }) => {
                log::info!("[FulfillmentWorker] Order {} is already {}, skipping", order.id, actual);
                report.skipped.push(order.id);
                return;
            }
            Err(e) => {
                log::error!("[FulfillmentWorker] Cannot claim order {}: {}", order.id, e);
                report.skipped.push(order.id);
                return;
            }
        };

        let provider = match self.store.registry_entry_by_id(order.provider).await {
            Ok(Some(entry)) => Some(entry.name),
            Ok(None) => None,
            Err(e) => {
                log::error!("[FulfillmentWorker] Registry lookup for order {} failed: {}", order.id, e);
                None
            }
        };
        let provider_label = provider.clone().unwrap_or_default();
        self.emit_status(&order, &provider_label);

        let result = match &provider {
            Some(identifier) => self.deploy(&order, identifier).await,
            None => Err(DeployError::ProviderNotFound(format!("registry entry {}", order.provider))),
        };

        let target = match &result {
            Ok(receipt) => {
                log::info!(
                    "[FulfillmentWorker] Order {} deployed by '{}': {}",
                    order.id,
                    provider_label,
                    receipt.message
                );
                OrderStatus::Deployed
            }
            Err(e) => {
                log::error!("[FulfillmentWorker] Order {} failed to deploy via '{}': {}", order.id, provider_label, e);
                OrderStatus::Failed
            }
        };

        match self.finish(&order, target).await {
            Ok(order) => {
                self.emit_status(&order, &provider_label);
                match target {
                    OrderStatus::Deployed => report.deployed.push(order.id),
                    _ => report.failed.push(order.id),
                }
            }
            Err(StorageSystemError::StaleStatus { actual, .. }) => {
                log::warn!(
                    "[FulfillmentWorker] Order {} was moved to {} while deploying, leaving it there",
                    order.id,
                    actual
                );
                report.skipped.push(order.id);
            }
            Err(e) => {
                log::error!(
                    "[FulfillmentWorker] Order {} is stuck in deploying, could not be moved to {}: {}. Manual intervention required",
                    order.id,
                    target,
                    e
                );
                report.skipped.push(order.id);
            }
        }
    }

    /// Final `deploying` transition, retried once unless another writer
    /// already moved the order.
    async fn finish(&self, order: &Order, target: OrderStatus) -> Result<Order, StorageSystemError> {
        match self
            .store
            .transition_order(order.id, OrderStatus::Deploying, target)
            .await
        {
            Ok(order) => Ok(order),
            Err(e @ StorageSystemError::StaleStatus { .. }) => Err(e),
            Err(e) => {
                log::warn!(
                    "[FulfillmentWorker] Moving order {} to {} failed, retrying once: {}",
                    order.id,
                    target,
                    e
                );
                self.store
                    .transition_order(order.id, OrderStatus::Deploying, target)
                    .await
            }
        }
    }

    /// Call the provider's deploy under the configured timeout.
    pub async fn deploy(&self, order: &Order, provider: &str) -> Result<DeploymentReceipt, DeployError> {
        if !self.registry.read().await.is_deployable(provider) {
            return Err(DeployError::NotDeployable(provider.to_string()));
        }

        let implementation = self
            .resolver
            .resolve_provider(provider)
            .await
            .ok_or_else(|| DeployError::ProviderNotFound(provider.to_string()))?;

        let service = self
            .store
            .service(order.service)
            .await?
            .ok_or(DeployError::ServiceNotFound(order.service))?;

        let config = config_map(&self.store.order_config(order.id).await?);
        let request = DeploymentRequest {
            order: order.clone(),
            service,
            config,
        };

        match tokio::time::timeout(self.deploy_timeout, implementation.deploy(&request)).await {
            Ok(result) => result,
            Err(_) => Err(DeployError::TimedOut(self.deploy_timeout)),
        }
    }

    fn emit_status(&self, order: &Order, provider: &str) {
        self.bus.emit_event(&SystemEvent::OrderStatusChanged {
            order_id: order.id,
            provider: provider.to_string(),
            status: order.status,
        });
    }
}
