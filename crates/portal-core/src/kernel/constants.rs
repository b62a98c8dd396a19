/// Application name
pub const APP_NAME: &str = "Portal";

/// Version of the running core, checked by `runtime:` plugin dependencies
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Manifest file expected inside every plugin directory
pub const MANIFEST_FILE_NAME: &str = "plugin.json";

/// Default plugins directory
pub const DEFAULT_PLUGINS_DIR: &str = "plugins";

/// Default data directory (store snapshot and cron markers)
pub const DEFAULT_DATA_DIR: &str = "data";

/// Store snapshot file name, relative to the data directory
pub const STORE_SNAPSHOT_FILE: &str = "store.json";

/// Cron marker directory name, relative to the data directory
pub const CRON_MARKER_DIR: &str = "cron";

/// Job id of the fulfillment worker
pub const FULFILLMENT_JOB_ID: &str = "service-worker";

/// Default fulfillment interval
pub const FULFILLMENT_JOB_INTERVAL: &str = "1M";

/// Upper bound on a single provider deploy call
pub const DEFAULT_DEPLOY_TIMEOUT_SECS: u64 = 120;

/// Gateway written on new invoices
pub const DEFAULT_GATEWAY: &str = "manual";
