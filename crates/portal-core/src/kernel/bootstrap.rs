use std::sync::Arc;

use crate::event::{EventBus, SystemEvent};
use crate::kernel::constants;
use crate::kernel::error::Result;
use crate::orders::OrderManager;
use crate::plugin_system::dependency::{DependencyCheckers, PackageChecker, RuntimeVersionChecker};
use crate::plugin_system::loader::{LoadReport, PluginLoader};
use crate::plugin_system::registry::{PluginRegistry, SharedPluginRegistry};
use crate::plugin_system::resolver::CapabilityResolver;
use crate::plugin_system::PluginCatalog;
use crate::storage::{PortalConfig, Store};
use crate::worker::{CronJob, FileMarkerStore, FulfillmentWorker, Interval, MarkerStore, RunOutcome, TickReport};

/// Application context.
///
/// Owns one instance of every collaborator and wires them together: the
/// loader, resolver, order manager and worker all share the same store,
/// event bus and plugin registry.
pub struct Application {
    config: PortalConfig,
    store: Arc<dyn Store>,
    bus: EventBus,
    registry: SharedPluginRegistry,
    loader: PluginLoader,
    resolver: CapabilityResolver,
    orders: OrderManager,
    worker: FulfillmentWorker,
    markers: Arc<dyn MarkerStore>,
}

impl Application {
    /// Build the context. Cron markers go to `<data_dir>/cron`.
    pub fn new(config: PortalConfig, store: Arc<dyn Store>, catalog: PluginCatalog) -> Result<Self> {
        let markers: Arc<dyn MarkerStore> = Arc::new(FileMarkerStore::new(config.cron_marker_dir()));
        Self::with_markers(config, store, catalog, markers)
    }

    pub fn with_markers(
        config: PortalConfig,
        store: Arc<dyn Store>,
        catalog: PluginCatalog,
        markers: Arc<dyn MarkerStore>,
    ) -> Result<Self> {
        log::info!("Initializing {} v{}", constants::APP_NAME, constants::RUNTIME_VERSION);

        let bus = EventBus::new();
        let registry: SharedPluginRegistry = PluginRegistry::shared();
        let checkers = DependencyCheckers::new(
            PackageChecker::new(config.installed_packages.iter().cloned()),
            RuntimeVersionChecker::from_version_str(constants::RUNTIME_VERSION)
                .map_err(crate::plugin_system::PluginSystemError::from)?,
        );

        let loader = PluginLoader::new(
            Arc::clone(&store),
            bus.clone(),
            catalog,
            Arc::clone(&registry),
            checkers,
        );
        let resolver = CapabilityResolver::new(Arc::clone(&registry));
        let orders = OrderManager::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            resolver.clone(),
            bus.clone(),
            config.default_gateway.clone(),
            config.invoice_due_days,
        );
        let worker = FulfillmentWorker::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            resolver.clone(),
            bus.clone(),
            config.deploy_timeout(),
        );

        log::info!("Using store '{}'", store.name());
        log::info!("Using plugins directory: {}", config.plugins_dir.display());
        log::info!("Using data directory: {}", config.data_dir.display());

        Ok(Self {
            config,
            store,
            bus,
            registry,
            loader,
            resolver,
            orders,
            worker,
            markers,
        })
    }

    /// Load every plugin under the configured plugins directory, then emit
    /// the application-load event with the admitted identifiers.
    pub async fn load_plugins(&self) -> Result<LoadReport> {
        let report = self.loader.load_all(&self.config.plugins_dir).await?;
        let plugins = self.registry.read().await.loaded().to_vec();
        self.bus.emit_event(&SystemEvent::ApplicationLoad { plugins });
        Ok(report)
    }

    /// The fulfillment job as configured.
    pub fn fulfillment_job(&self) -> Result<CronJob> {
        let interval = Interval::parse(&self.config.worker.interval)?;
        Ok(CronJob::new(&self.config.worker.job_id, interval, Arc::clone(&self.markers))?)
    }

    /// Run one fulfillment tick if the job is due.
    pub async fn run_fulfillment_if_due(&self) -> Result<RunOutcome<TickReport>> {
        let job = self.fulfillment_job()?;
        let worker = self.worker.clone();
        Ok(job.run_if_due(|| async move { worker.tick().await }).await?)
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn registry(&self) -> &SharedPluginRegistry {
        &self.registry
    }

    pub fn loader(&self) -> &PluginLoader {
        &self.loader
    }

    pub fn resolver(&self) -> &CapabilityResolver {
        &self.resolver
    }

    pub fn orders(&self) -> &OrderManager {
        &self.orders
    }

    pub fn worker(&self) -> &FulfillmentWorker {
        &self.worker
    }
}
