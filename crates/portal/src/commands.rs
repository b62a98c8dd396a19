use portal_core::kernel::error::{Error, Result};
use portal_core::orders::SubmittedFields;
use portal_core::plugin_system::loader::LoadReport;
use portal_core::storage::models::{NewCategory, NewService};
use portal_core::worker::RunOutcome;
use portal_core::{Application, InvoiceStatus, MemoryStore, Store, TickReport};

use crate::cli::{CatalogCommand, Commands, InvoiceCommand, OrderCommand, PluginCommand, WorkerCommand};

pub async fn execute(app: &Application, report: &LoadReport, command: Commands) -> Result<()> {
    match command {
        Commands::Plugins { command } => plugins(app, report, command).await,
        Commands::Catalog { command } => catalog(app, command).await,
        Commands::Order { command } => order(app, command).await,
        Commands::Invoice { command } => invoice(app, command).await,
        Commands::Worker { command } => worker(app, command).await,
    }
}

/// Output when no subcommand is given.
pub async fn summary(app: &Application, store: &MemoryStore) -> Result<()> {
    let loaded = app.registry().read().await.loaded().to_vec();
    let counts = store.counts().await;
    println!("Loaded plugins: {}", display_list(&loaded));
    println!(
        "Store: {} categories, {} services, {} orders, {} invoices",
        counts.categories, counts.services, counts.orders, counts.invoices
    );
    Ok(())
}

async fn plugins(app: &Application, report: &LoadReport, command: PluginCommand) -> Result<()> {
    match command {
        PluginCommand::Load => {
            for id in &report.admitted {
                println!("Loaded plugin '{}'", id);
            }
            for rejection in &report.rejected {
                let label = rejection
                    .identifier
                    .clone()
                    .unwrap_or_else(|| rejection.path.display().to_string());
                println!("Rejected '{}': {}", label, rejection.error);
            }
            println!(
                "{} loaded, {} rejected",
                report.admitted.len(),
                report.rejected.len()
            );
        }
        PluginCommand::List => {
            let registry = app.registry().read().await;
            let entries = app.store().registry_entries().await?;
            if entries.is_empty() {
                println!("No plugins registered.");
            }
            for entry in entries {
                println!(
                    "{} ({}) enabled={} locked={} deleted={} loaded={} deployable={} date={}",
                    entry.name,
                    entry.kind,
                    entry.enabled,
                    entry.locked,
                    entry.deleted,
                    registry.is_loaded(&entry.name),
                    registry.is_deployable(&entry.name),
                    entry.date.to_rfc3339()
                );
            }
        }
        PluginCommand::Enable { name } => {
            app.store().set_enabled(&name, true).await?;
            println!("Plugin '{}' enabled; restart to load it.", name);
        }
        PluginCommand::Disable { name } => {
            app.store().set_enabled(&name, false).await?;
            println!("Plugin '{}' disabled; it will not load on the next start.", name);
        }
    }
    Ok(())
}

async fn catalog(app: &Application, command: CatalogCommand) -> Result<()> {
    let store = app.store();
    match command {
        CatalogCommand::AddCategory { uri, name } => {
            let category = store.insert_category(NewCategory { uri, name }).await?;
            println!("Created category {} '{}'", category.id, category.uri);
        }
        CatalogCommand::AddService {
            uri,
            name,
            category,
            provider,
            days,
        } => {
            let category = store
                .category_by_uri(&category)
                .await?
                .ok_or_else(|| Error::Other(format!("Category '{}' not found", category)))?;
            let entry = store
                .registry_entry(&provider)
                .await?
                .filter(|entry| !entry.deleted)
                .ok_or_else(|| Error::Other(format!("Plugin '{}' is not registered", provider)))?;
            let service = store
                .insert_service(NewService {
                    uri,
                    name,
                    category: category.id,
                    provider: entry.id,
                    period_days: days,
                })
                .await?;
            println!(
                "Created service {} '{}' in '{}' via '{}'",
                service.id, service.uri, category.uri, entry.name
            );
        }
    }
    Ok(())
}

async fn order(app: &Application, command: OrderCommand) -> Result<()> {
    match command {
        OrderCommand::Create {
            user,
            category,
            service,
            fields,
        } => {
            let submitted = parse_fields(&fields)?;
            let details = app.orders().create_order(user, &category, &service, &submitted).await?;
            let invoice = details
                .invoice
                .as_ref()
                .map(|invoice| invoice.id.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "Created order {} (status {}, invoice {})",
                details.order.id, details.order.status, invoice
            );
        }
        OrderCommand::Show { id } => {
            let details = app.orders().order_details(id).await?;
            println!("Order {}", details.order.id);
            println!("  status:   {}", details.order.status);
            println!("  user:     {}", details.order.user);
            println!("  service:  {}", details.service.uri);
            if let Some(category) = &details.category {
                println!("  category: {}", category.uri);
            }
            println!("  provider: {}", details.provider);
            println!("  days:     {}", details.order.days_left);
            match &details.invoice {
                Some(invoice) => println!(
                    "  invoice:  {} ({} via {})",
                    invoice.id, invoice.status, invoice.payment_gateway
                ),
                None => println!("  invoice:  -"),
            }
            for entry in details.config.iter().filter(|entry| !entry.deleted) {
                println!("  config:   {}={}", entry.key, entry.value);
            }
        }
    }
    Ok(())
}

async fn invoice(app: &Application, command: InvoiceCommand) -> Result<()> {
    let (id, status) = match command {
        InvoiceCommand::Pay { id } => (id, InvoiceStatus::Paid),
        InvoiceCommand::Cancel { id } => (id, InvoiceStatus::Cancelled),
        InvoiceCommand::Refund { id } => (id, InvoiceStatus::Refunded),
    };
    let invoice = app.orders().settle_invoice(id, status).await?;
    println!("Invoice {} is now {}", invoice.id, invoice.status);
    Ok(())
}

async fn worker(app: &Application, command: WorkerCommand) -> Result<()> {
    let WorkerCommand::Run { force } = command;
    if force {
        let report = app.worker().tick().await?;
        print_tick(&report);
        return Ok(());
    }
    match app.run_fulfillment_if_due().await? {
        RunOutcome::Ran(report) => print_tick(&report),
        RunOutcome::NotDue { next_due } => {
            println!("Fulfillment not due until {}", next_due.to_rfc3339());
        }
    }
    Ok(())
}

fn print_tick(report: &TickReport) {
    println!(
        "Fulfillment: {} deployed, {} failed, {} skipped",
        report.deployed.len(),
        report.failed.len(),
        report.skipped.len()
    );
    for id in &report.deployed {
        println!("  order {} deployed", id);
    }
    for id in &report.failed {
        println!("  order {} failed", id);
    }
}

/// `key=value` pairs as submitted fields. `key=` submits an empty value.
fn parse_fields(pairs: &[String]) -> Result<SubmittedFields> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), Some(value.to_string())))
            }
            _ => Err(Error::Other(format!("Expected key=value, got '{}'", pair))),
        })
        .collect()
}

fn display_list(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields_splits_on_first_equals() {
        let fields = parse_fields(&["server_name=web-01".to_string(), "note=a=b".to_string()]).unwrap();
        assert_eq!(fields.get("server_name"), Some(&Some("web-01".to_string())));
        assert_eq!(fields.get("note"), Some(&Some("a=b".to_string())));
    }

    #[test]
    fn test_parse_fields_keeps_empty_values() {
        let fields = parse_fields(&["server_name=".to_string()]).unwrap();
        assert_eq!(fields.get("server_name"), Some(&Some(String::new())));
    }

    #[test]
    fn test_parse_fields_rejects_missing_equals() {
        assert!(parse_fields(&["server_name".to_string()]).is_err());
        assert!(parse_fields(&["=value".to_string()]).is_err());
    }

    #[test]
    fn test_display_list() {
        assert_eq!(display_list(&[]), "(none)");
        assert_eq!(display_list(&["a".to_string(), "b".to_string()]), "a, b");
    }
}
