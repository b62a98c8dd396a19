use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::tempdir;

use crate::storage::{ConfigFormat, PortalConfig, StorageSystemError};

#[test]
fn test_format_from_path() {
    assert_eq!(ConfigFormat::from_path(&PathBuf::from("portal.json")), Some(ConfigFormat::Json));
    assert_eq!(ConfigFormat::from_path(&PathBuf::from("portal.JSON")), Some(ConfigFormat::Json));
    #[cfg(feature = "yaml-config")]
    assert_eq!(ConfigFormat::from_path(&PathBuf::from("portal.yml")), Some(ConfigFormat::Yaml));
    #[cfg(feature = "toml-config")]
    assert_eq!(ConfigFormat::from_path(&PathBuf::from("portal.toml")), Some(ConfigFormat::Toml));
    assert_eq!(ConfigFormat::from_path(&PathBuf::from("portal.ini")), None);
    assert_eq!(ConfigFormat::from_path(&PathBuf::from("portal")), None);
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let config = PortalConfig::load(&dir.path().join("portal.json")).unwrap();

    assert_eq!(config, PortalConfig::default());
    assert_eq!(config.worker.job_id, "service-worker");
    assert_eq!(config.worker.interval, "1M");
    assert_eq!(config.default_gateway, "manual");
    assert_eq!(config.deploy_timeout(), Duration::from_secs(120));
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("portal.ini");
    fs::write(&path, "plugins_dir=x").unwrap();

    assert!(matches!(
        PortalConfig::load(&path),
        Err(StorageSystemError::UnsupportedConfigFormat(_))
    ));
}

#[test]
fn test_partial_json_keeps_defaults_for_the_rest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("portal.json");
    fs::write(
        &path,
        r#"{"data_dir": "/var/lib/portal", "worker": {"interval": "30S"}}"#,
    )
    .unwrap();

    let config = PortalConfig::load(&path).unwrap();

    assert_eq!(config.data_dir, PathBuf::from("/var/lib/portal"));
    assert_eq!(config.worker.interval, "30S");
    assert_eq!(config.worker.job_id, "service-worker");
    assert_eq!(config.store_snapshot_path(), PathBuf::from("/var/lib/portal/store.json"));
    assert_eq!(config.cron_marker_dir(), PathBuf::from("/var/lib/portal/cron"));
}

#[test]
fn test_malformed_json_is_a_deserialization_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("portal.json");
    fs::write(&path, "{ plugins_dir: ").unwrap();

    assert!(matches!(
        PortalConfig::load(&path),
        Err(StorageSystemError::DeserializationError { .. })
    ));
}

#[cfg(feature = "toml-config")]
#[test]
fn test_toml_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("portal.toml");
    fs::write(
        &path,
        r#"
plugins_dir = "extensions"
installed_packages = ["ffmpeg", "openssl"]
invoice_due_days = 7

[worker]
deploy_timeout_secs = 30
"#,
    )
    .unwrap();

    let config = PortalConfig::load(&path).unwrap();

    assert_eq!(config.plugins_dir, PathBuf::from("extensions"));
    assert_eq!(config.installed_packages, vec!["ffmpeg", "openssl"]);
    assert_eq!(config.invoice_due_days, 7);
    assert_eq!(config.deploy_timeout(), Duration::from_secs(30));
}

#[cfg(feature = "yaml-config")]
#[test]
fn test_yaml_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("portal.yaml");
    fs::write(&path, "default_gateway: stripe\nworker:\n  job_id: nightly\n").unwrap();

    let config = PortalConfig::load(&path).unwrap();

    assert_eq!(config.default_gateway, "stripe");
    assert_eq!(config.worker.job_id, "nightly");
    assert_eq!(config.worker.interval, "1M");
}

#[test]
fn test_save_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("portal.json");
    let config = PortalConfig {
        installed_packages: vec!["git".to_string()],
        invoice_due_days: 14,
        ..PortalConfig::default()
    };

    config.save(&path).unwrap();

    assert_eq!(PortalConfig::load(&path).unwrap(), config);
}
