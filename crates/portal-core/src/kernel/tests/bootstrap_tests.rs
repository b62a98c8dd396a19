use std::sync::{Arc, Mutex};

use tempfile::tempdir;

use crate::event::types::APP_LOAD;
use crate::kernel::Application;
use crate::kernel::error::Error;
use crate::plugin_system::manifest::PluginType;
use crate::plugin_system::PluginCatalog;
use crate::storage::{MemoryStore, PortalConfig, Store};
use crate::tests::common::{manifest, write_plugin};
use crate::worker::{MemoryMarkerStore, RunOutcome, WorkerError};

fn config_in(root: &std::path::Path) -> PortalConfig {
    PortalConfig {
        plugins_dir: root.join("plugins"),
        data_dir: root.join("data"),
        ..PortalConfig::default()
    }
}

fn app(config: PortalConfig) -> Application {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    Application::with_markers(config, store, PluginCatalog::new(), Arc::new(MemoryMarkerStore::new())).unwrap()
}

#[tokio::test]
async fn test_load_plugins_announces_application_load() {
    let root = tempdir().unwrap();
    let config = config_in(root.path());
    write_plugin(&config.plugins_dir, "beta", &manifest("beta", PluginType::Event));
    write_plugin(&config.plugins_dir, "alpha", &manifest("alpha", PluginType::Components));
    let app = app(config);

    let announced = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&announced);
    app.bus().on(APP_LOAD, move |args| {
        sink.lock().unwrap().push(args[0].clone());
        Ok(())
    });

    let report = app.load_plugins().await.unwrap();

    assert_eq!(report.admitted, vec!["alpha", "beta"]);
    assert_eq!(*announced.lock().unwrap(), vec![serde_json::json!(["alpha", "beta"])]);
    assert_eq!(app.store().registry_entries().await.unwrap().len(), 2);
    assert_eq!(app.registry().read().await.plugin_count(), 2);
}

#[tokio::test]
async fn test_missing_plugins_dir_fails_load() {
    let root = tempdir().unwrap();
    let app = app(config_in(root.path()));

    assert!(matches!(app.load_plugins().await, Err(Error::PluginSystem(_))));
}

#[tokio::test]
async fn test_fulfillment_runs_once_per_interval() {
    let root = tempdir().unwrap();
    let app = app(config_in(root.path()));

    let first = app.run_fulfillment_if_due().await.unwrap();
    assert!(matches!(first, RunOutcome::Ran(ref report) if report.is_empty()));

    let second = app.run_fulfillment_if_due().await.unwrap();
    assert!(matches!(second, RunOutcome::NotDue { .. }));
}

#[test]
fn test_invalid_worker_settings_are_reported() {
    let root = tempdir().unwrap();
    let mut config = config_in(root.path());
    config.worker.interval = "soon".to_string();
    let app = app(config);

    assert!(matches!(
        app.fulfillment_job(),
        Err(Error::Worker(WorkerError::InvalidInterval { .. }))
    ));
}

#[test]
fn test_file_markers_live_under_data_dir() {
    let root = tempdir().unwrap();
    let config = config_in(root.path());
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

    let app = Application::new(config.clone(), store, PluginCatalog::new()).unwrap();

    assert_eq!(app.config().cron_marker_dir(), root.path().join("data").join("cron"));
    assert_eq!(app.fulfillment_job().unwrap().id(), "service-worker");
    assert_eq!(app.worker().deploy_timeout(), config.deploy_timeout());
}
