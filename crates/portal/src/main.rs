mod cli;
mod commands;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use portal_core::kernel::error::Result;
use portal_core::{Application, MemoryStore, PluginCatalog, PortalConfig};

use crate::cli::CliArgs;

/// Plugins linked into this binary. Manifests without an entry here are still
/// admitted but have no listeners or provider.
fn plugin_catalog() -> Result<PluginCatalog> {
    Ok(PluginCatalog::new()
        .with(vps_provider::IDENTIFIER, vps_provider::factory)?
        .with(audit_log::IDENTIFIER, audit_log::factory)?)
}

async fn run(args: CliArgs) -> Result<()> {
    let config = PortalConfig::load(&args.config)?;
    let store = Arc::new(MemoryStore::open(config.store_snapshot_path())?);
    let app = Application::new(config, store.clone(), plugin_catalog()?)?;

    let report = app.load_plugins().await?;
    log::info!(
        "{} plugin(s) admitted, {} rejected",
        report.admitted.len(),
        report.rejected.len()
    );

    let result = match args.command {
        Some(command) => commands::execute(&app, &report, command).await,
        None => commands::summary(&app, &store).await,
    };

    // Persist whatever the command managed to write, even when it failed later.
    store.save_snapshot().await?;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    if let Err(e) = logging::init(args.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.code() {
                Some(code) => eprintln!("Error [{}]: {}", code, e),
                None => eprintln!("Error: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}
