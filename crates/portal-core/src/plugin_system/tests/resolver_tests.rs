use tempfile::tempdir;

use crate::plugin_system::PluginCatalog;
use crate::plugin_system::manifest::PluginType;
use crate::tests::common::{
    DeployBehavior, harness, manifest, provider_manifest, register_listener_plugin, register_provider,
    server_requirements, write_plugin,
};

#[tokio::test]
async fn test_resolve_provider_builds_fresh_instance_each_call() {
    let dir = tempdir().unwrap();
    write_plugin(dir.path(), "vps", &provider_manifest("vps"));
    let mut catalog = PluginCatalog::new();
    let tracker = register_provider(&mut catalog, "vps", server_requirements(), DeployBehavior::Succeed);
    let h = harness(catalog);
    h.loader.load_all(dir.path()).await.unwrap();
    assert_eq!(tracker.instantiations(), 1, "admission builds one instance");

    assert!(h.resolver.resolve_provider("vps").await.is_some());
    assert!(h.resolver.resolve_provider("vps").await.is_some());

    assert_eq!(tracker.instantiations(), 3);
}

#[tokio::test]
async fn test_order_requirements_come_from_provider() {
    let dir = tempdir().unwrap();
    write_plugin(dir.path(), "vps", &provider_manifest("vps"));
    let mut catalog = PluginCatalog::new();
    register_provider(&mut catalog, "vps", server_requirements(), DeployBehavior::Succeed);
    let h = harness(catalog);
    h.loader.load_all(dir.path()).await.unwrap();

    let requirements = h.resolver.order_requirements("vps").await.unwrap();

    assert_eq!(requirements.required().collect::<Vec<_>>(), vec!["server_name"]);
    assert_eq!(requirements.len(), 2);
}

#[tokio::test]
async fn test_unresolvable_identifiers() {
    let dir = tempdir().unwrap();
    write_plugin(dir.path(), "audit", &manifest("audit", PluginType::Event));
    write_plugin(dir.path(), "bare", &provider_manifest("bare"));
    let mut catalog = PluginCatalog::new();
    // Providers declared under a non-provider type are never resolved
    register_provider(&mut catalog, "audit", server_requirements(), DeployBehavior::Succeed);
    let h = harness(catalog);
    h.loader.load_all(dir.path()).await.unwrap();

    assert!(h.resolver.resolve_provider("missing").await.is_none());
    assert!(h.resolver.resolve_provider("audit").await.is_none());
    assert!(h.resolver.resolve_provider("bare").await.is_none(), "no compiled-in implementation");
    assert!(h.resolver.order_requirements("bare").await.is_none());
}

#[tokio::test]
async fn test_provider_typed_plugin_without_capability_resolves_to_none() {
    let dir = tempdir().unwrap();
    write_plugin(dir.path(), "hollow", &provider_manifest("hollow"));
    let mut catalog = PluginCatalog::new();
    register_listener_plugin(&mut catalog, "hollow", &[]);
    let h = harness(catalog);
    h.loader.load_all(dir.path()).await.unwrap();

    assert!(h.registry.read().await.is_loaded("hollow"));
    assert!(h.resolver.resolve_provider("hollow").await.is_none());
}
