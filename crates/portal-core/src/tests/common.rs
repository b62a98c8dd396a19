use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::event::EventBus;
use crate::kernel::constants::{MANIFEST_FILE_NAME, RUNTIME_VERSION};
use crate::orders::OrderManager;
use crate::plugin_system::dependency::{DependencyCheckers, PackageChecker, RuntimeVersionChecker};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manifest::{DescriptorBuilder, PluginType};
use crate::plugin_system::provider::{
    DeployError, DeploymentReceipt, DeploymentRequest, FieldSpec, FieldSpecMap, FieldType, Provider,
};
use crate::plugin_system::registry::{PluginRegistry, SharedPluginRegistry};
use crate::plugin_system::{CapabilityResolver, Plugin, PluginCatalog, PluginLoader};
use crate::storage::models::{Category, NewCategory, NewService, Service};
use crate::storage::{MemoryStore, Store};
use crate::worker::FulfillmentWorker;

// ===== MOCK PLUGINS =====

#[derive(Debug, Clone)]
pub enum DeployBehavior {
    Succeed,
    Fail(String),
    Hang,
}

pub struct TestProvider {
    requirements: FieldSpecMap,
    behavior: DeployBehavior,
    deploy_calls: Arc<AtomicUsize>,
    last_config: Arc<Mutex<Option<Vec<(String, String)>>>>,
}

#[async_trait]
impl Provider for TestProvider {
    fn order_requirements(&self) -> FieldSpecMap {
        self.requirements.clone()
    }

    async fn deploy(&self, request: &DeploymentRequest) -> Result<DeploymentReceipt, DeployError> {
        self.deploy_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_config.lock().unwrap() = Some(
            request
                .config
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
        match &self.behavior {
            DeployBehavior::Succeed => Ok(DeploymentReceipt {
                reference: Some(format!("test-{}", request.order.id)),
                message: "provisioned".to_string(),
            }),
            DeployBehavior::Fail(message) => Err(DeployError::Rejected(message.clone())),
            DeployBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(DeploymentReceipt::default())
            }
        }
    }
}

/// Plugin recording every event it subscribed to in `seen`.
pub struct TestPlugin {
    id: String,
    provider: Option<Arc<TestProvider>>,
    events: Vec<&'static str>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl Plugin for TestPlugin {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn register_events(&self, bus: &EventBus) -> Result<(), PluginSystemError> {
        for name in &self.events {
            let seen = Arc::clone(&self.seen);
            let label = format!("{}:{}", self.id, name);
            bus.on(name, move |args| {
                seen.lock().unwrap().push(format!("{} {}", label, Value::Array(args.to_vec())));
                Ok(())
            });
        }
        Ok(())
    }

    fn provider(&self) -> Option<Arc<dyn Provider>> {
        self.provider.clone().map(|p| p as Arc<dyn Provider>)
    }
}

/// Counters and logs shared by every instance a catalog entry builds.
#[derive(Clone, Default)]
pub struct PluginTracker {
    pub instantiations: Arc<AtomicUsize>,
    pub deploy_calls: Arc<AtomicUsize>,
    pub seen: Arc<Mutex<Vec<String>>>,
    pub last_config: Arc<Mutex<Option<Vec<(String, String)>>>>,
}

impl PluginTracker {
    pub fn instantiations(&self) -> usize {
        self.instantiations.load(Ordering::SeqCst)
    }

    pub fn deploy_calls(&self) -> usize {
        self.deploy_calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

/// `server_name` (required) then `root_password` (optional).
pub fn server_requirements() -> FieldSpecMap {
    FieldSpecMap::new()
        .with("server_name", FieldSpec::required(FieldType::Text, "Server name"))
        .with("root_password", FieldSpec::optional(FieldType::Password, "Root password"))
}

pub fn register_provider(
    catalog: &mut PluginCatalog,
    id: &str,
    requirements: FieldSpecMap,
    behavior: DeployBehavior,
) -> PluginTracker {
    let tracker = PluginTracker::default();
    let factory_tracker = tracker.clone();
    let plugin_id = id.to_string();
    catalog
        .register(id, move || {
            factory_tracker.instantiations.fetch_add(1, Ordering::SeqCst);
            Box::new(TestPlugin {
                id: plugin_id.clone(),
                provider: Some(Arc::new(TestProvider {
                    requirements: requirements.clone(),
                    behavior: behavior.clone(),
                    deploy_calls: Arc::clone(&factory_tracker.deploy_calls),
                    last_config: Arc::clone(&factory_tracker.last_config),
                })),
                events: Vec::new(),
                seen: Arc::clone(&factory_tracker.seen),
            }) as Box<dyn Plugin>
        })
        .unwrap();
    tracker
}

pub fn register_listener_plugin(catalog: &mut PluginCatalog, id: &str, events: &[&'static str]) -> PluginTracker {
    let tracker = PluginTracker::default();
    let factory_tracker = tracker.clone();
    let plugin_id = id.to_string();
    let events = events.to_vec();
    catalog
        .register(id, move || {
            factory_tracker.instantiations.fetch_add(1, Ordering::SeqCst);
            Box::new(TestPlugin {
                id: plugin_id.clone(),
                provider: None,
                events: events.clone(),
                seen: Arc::clone(&factory_tracker.seen),
            }) as Box<dyn Plugin>
        })
        .unwrap();
    tracker
}

// ===== FIXTURES =====

pub fn manifest(id: &str, kind: PluginType) -> Value {
    DescriptorBuilder::new(id, kind).to_json()
}

pub fn provider_manifest(id: &str) -> Value {
    DescriptorBuilder::new(id, PluginType::Provider).can_deploy(true).to_json()
}

pub fn write_plugin(plugins_dir: &Path, dir_name: &str, manifest: &Value) {
    let dir = plugins_dir.join(dir_name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(MANIFEST_FILE_NAME), serde_json::to_vec_pretty(manifest).unwrap()).unwrap();
}

pub fn write_raw_manifest(plugins_dir: &Path, dir_name: &str, contents: &str) {
    let dir = plugins_dir.join(dir_name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(MANIFEST_FILE_NAME), contents).unwrap();
}

/// Every collaborator wired around one in-memory store.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub bus: EventBus,
    pub registry: SharedPluginRegistry,
    pub resolver: CapabilityResolver,
    pub loader: PluginLoader,
    pub orders: OrderManager,
    pub worker: FulfillmentWorker,
}

pub fn harness(catalog: PluginCatalog) -> Harness {
    harness_with(catalog, &[], Duration::from_secs(5))
}

pub fn harness_with(catalog: PluginCatalog, packages: &[&str], deploy_timeout: Duration) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn Store> = store.clone();
    let bus = EventBus::new();
    let registry = PluginRegistry::shared();
    let checkers = DependencyCheckers::new(
        PackageChecker::new(packages.iter().copied()),
        RuntimeVersionChecker::from_version_str(RUNTIME_VERSION).unwrap(),
    );
    let loader = PluginLoader::new(
        Arc::clone(&dyn_store),
        bus.clone(),
        catalog,
        Arc::clone(&registry),
        checkers,
    );
    let resolver = CapabilityResolver::new(Arc::clone(&registry));
    let orders = OrderManager::new(
        Arc::clone(&dyn_store),
        Arc::clone(&registry),
        resolver.clone(),
        bus.clone(),
        "manual",
        0,
    );
    let worker = FulfillmentWorker::new(
        Arc::clone(&dyn_store),
        Arc::clone(&registry),
        resolver.clone(),
        bus.clone(),
        deploy_timeout,
    );
    Harness {
        store,
        bus,
        registry,
        resolver,
        loader,
        orders,
        worker,
    }
}

/// A category `hosting` with a 30-day service `vps-small` owned by `provider`.
/// The provider must already have a registry entry.
pub async fn seed_service(store: &MemoryStore, provider: &str) -> (Category, Service) {
    let entry = store.registry_entry(provider).await.unwrap().expect("provider registry entry");
    let category = store
        .insert_category(NewCategory {
            uri: "hosting".to_string(),
            name: "Hosting".to_string(),
        })
        .await
        .unwrap();
    let service = store
        .insert_service(NewService {
            uri: "vps-small".to_string(),
            name: "Small VPS".to_string(),
            category: category.id,
            provider: entry.id,
            period_days: 30,
        })
        .await
        .unwrap();
    (category, service)
}

pub fn fields(pairs: &[(&str, Option<&str>)]) -> crate::orders::SubmittedFields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
        .collect()
}
