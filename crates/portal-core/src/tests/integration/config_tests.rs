use std::fs;
use std::sync::Arc;

use tempfile::tempdir;

use crate::kernel::Application;
use crate::plugin_system::PluginCatalog;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manifest::{DescriptorBuilder, PluginType};
use crate::storage::{MemoryStore, PortalConfig, Store};
use crate::tests::common::write_plugin;

/// A config file drives the plugins directory and the `package:` checker.
#[tokio::test]
async fn test_config_file_drives_plugin_loading() {
    let root = tempdir().unwrap();
    let plugins = root.path().join("extensions");
    let config_path = root.path().join("portal.json");
    fs::write(
        &config_path,
        serde_json::to_vec(&serde_json::json!({
            "plugins_dir": plugins,
            "data_dir": root.path().join("data"),
            "installed_packages": ["ffmpeg"],
        }))
        .unwrap(),
    )
    .unwrap();
    write_plugin(
        &plugins,
        "media",
        &DescriptorBuilder::new("media", PluginType::Event)
            .dependency("package:ffmpeg")
            .to_json(),
    );
    write_plugin(
        &plugins,
        "transcode",
        &DescriptorBuilder::new("transcode", PluginType::Event)
            .dependency("package:gpu-driver")
            .to_json(),
    );

    let config = PortalConfig::load(&config_path).unwrap();
    let store = Arc::new(MemoryStore::open(config.store_snapshot_path()).unwrap());
    let app = Application::new(config, store.clone(), PluginCatalog::new()).unwrap();
    let report = app.load_plugins().await.unwrap();

    assert_eq!(report.admitted, vec!["media"]);
    assert!(matches!(
        report.rejection("transcode").unwrap().error,
        PluginSystemError::DependencyUnmet { .. }
    ));

    store.save_snapshot().await.unwrap();
    let reopened = MemoryStore::open(root.path().join("data").join("store.json")).unwrap();
    assert!(reopened.registry_entry("media").await.unwrap().is_some());
    assert!(reopened.registry_entry("transcode").await.unwrap().is_none());
}

/// A plugin disabled in a previous run stays out on the next start.
#[tokio::test]
async fn test_disabled_plugin_stays_disabled_across_restarts() {
    let root = tempdir().unwrap();
    let config = PortalConfig {
        plugins_dir: root.path().join("plugins"),
        data_dir: root.path().join("data"),
        ..PortalConfig::default()
    };
    write_plugin(&config.plugins_dir, "alpha", &crate::tests::common::manifest("alpha", PluginType::Event));

    {
        let store = Arc::new(MemoryStore::open(config.store_snapshot_path()).unwrap());
        let app = Application::new(config.clone(), store.clone(), PluginCatalog::new()).unwrap();
        assert_eq!(app.load_plugins().await.unwrap().admitted, vec!["alpha"]);
        store.set_enabled("alpha", false).await.unwrap();
        store.save_snapshot().await.unwrap();
    }

    let store = Arc::new(MemoryStore::open(config.store_snapshot_path()).unwrap());
    let app = Application::new(config, store, PluginCatalog::new()).unwrap();
    let report = app.load_plugins().await.unwrap();

    assert!(report.admitted.is_empty());
    assert!(matches!(
        report.rejection("alpha").unwrap().error,
        PluginSystemError::Disabled(_)
    ));
}
