use std::sync::Arc;

use tempfile::tempdir;

use crate::event::types::{ORDER_CREATED, ORDER_DEPLOYED, ORDER_DEPLOYING, ORDER_PROCESSED};
use crate::kernel::Application;
use crate::orders::{InvoiceStatus, OrderStatus};
use crate::plugin_system::PluginCatalog;
use crate::storage::{MemoryStore, PortalConfig, Store};
use crate::tests::common::{
    DeployBehavior, fields, provider_manifest, register_listener_plugin, register_provider, seed_service,
    server_requirements, write_plugin,
};
use crate::plugin_system::manifest::PluginType;
use crate::worker::RunOutcome;

/// Load, order, pay, deploy: the whole pipeline through one application context.
#[tokio::test]
async fn test_order_goes_from_creation_to_deployment() {
    let root = tempdir().unwrap();
    let config = PortalConfig {
        plugins_dir: root.path().join("plugins"),
        data_dir: root.path().join("data"),
        ..PortalConfig::default()
    };
    write_plugin(&config.plugins_dir, "vps", &provider_manifest("vps"));
    write_plugin(&config.plugins_dir, "audit", &crate::tests::common::manifest("audit", PluginType::Event));

    let mut catalog = PluginCatalog::new();
    let provider = register_provider(&mut catalog, "vps", server_requirements(), DeployBehavior::Succeed);
    let audit = register_listener_plugin(
        &mut catalog,
        "audit",
        &[ORDER_CREATED, ORDER_PROCESSED, ORDER_DEPLOYING, ORDER_DEPLOYED],
    );

    let store = Arc::new(MemoryStore::open(config.store_snapshot_path()).unwrap());
    let app = Application::new(config.clone(), store.clone(), catalog).unwrap();
    let report = app.load_plugins().await.unwrap();
    assert_eq!(report.admitted, vec!["audit", "vps"]);
    seed_service(&store, "vps").await;

    let details = app
        .orders()
        .create_order(
            5,
            "hosting",
            "vps-small",
            &fields(&[("server_name", Some("web1")), ("root_password", Some("pw"))]),
        )
        .await
        .unwrap();
    let order_id = details.order.id;
    app.orders()
        .settle_invoice(details.invoice.unwrap().id, InvoiceStatus::Paid)
        .await
        .unwrap();

    let outcome = app.run_fulfillment_if_due().await.unwrap();
    match outcome {
        RunOutcome::Ran(tick) => assert_eq!(tick.deployed, vec![order_id]),
        other => panic!("fulfillment should have run: {:?}", other),
    }
    assert!(!app.run_fulfillment_if_due().await.unwrap().ran());

    assert_eq!(
        store.order(order_id).await.unwrap().unwrap().status,
        OrderStatus::Deployed
    );
    assert_eq!(provider.deploy_calls(), 1);
    assert_eq!(
        audit.seen(),
        vec![
            format!("audit:{} [{},\"vps\"]", ORDER_CREATED, order_id),
            format!("audit:{} [{},\"vps\"]", ORDER_PROCESSED, order_id),
            format!("audit:{} [{},\"vps\"]", ORDER_DEPLOYING, order_id),
            format!("audit:{} [{},\"vps\"]", ORDER_DEPLOYED, order_id),
        ]
    );
    assert!(config.cron_marker_dir().join("service-worker.lastrun").exists());
}

/// An order whose provider goes away before fulfillment fails instead of
/// staying in the queue.
#[tokio::test]
async fn test_order_fails_when_provider_is_not_loaded_at_fulfillment() {
    let root = tempdir().unwrap();
    let config = PortalConfig {
        plugins_dir: root.path().join("plugins"),
        data_dir: root.path().join("data"),
        ..PortalConfig::default()
    };
    write_plugin(&config.plugins_dir, "vps", &provider_manifest("vps"));

    let order_id = {
        let mut catalog = PluginCatalog::new();
        register_provider(&mut catalog, "vps", server_requirements(), DeployBehavior::Succeed);
        let store = Arc::new(MemoryStore::open(config.store_snapshot_path()).unwrap());
        let app = Application::new(config.clone(), store.clone(), catalog).unwrap();
        app.load_plugins().await.unwrap();
        seed_service(&store, "vps").await;
        let details = app
            .orders()
            .create_order(1, "hosting", "vps-small", &fields(&[("server_name", Some("web1"))]))
            .await
            .unwrap();
        app.orders()
            .settle_invoice(details.invoice.unwrap().id, InvoiceStatus::Paid)
            .await
            .unwrap();
        store.save_snapshot().await.unwrap();
        details.order.id
    };

    // Restart with the provider directory removed
    std::fs::remove_dir_all(config.plugins_dir.join("vps")).unwrap();
    let store = Arc::new(MemoryStore::open(config.store_snapshot_path()).unwrap());
    let app = Application::new(config, store.clone(), PluginCatalog::new()).unwrap();
    app.load_plugins().await.unwrap();

    let tick = app.worker().tick().await.unwrap();

    assert_eq!(tick.failed, vec![order_id]);
    assert_eq!(store.order(order_id).await.unwrap().unwrap().status, OrderStatus::Failed);
}
