use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Portal: plugin-driven hosting storefront
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Configuration file (.json, .toml, .yaml); defaults apply when it does not exist
    #[arg(short, long, default_value = "portal.toml")]
    pub config: PathBuf,

    /// Print `pong` and exit
    #[arg(long)]
    pub ping: bool,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect and manage plugins
    Plugins {
        #[command(subcommand)]
        command: PluginCommand,
    },
    /// Manage categories and services
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Create and inspect orders
    Order {
        #[command(subcommand)]
        command: OrderCommand,
    },
    /// Settle invoices
    Invoice {
        #[command(subcommand)]
        command: InvoiceCommand,
    },
    /// Run the fulfillment worker
    Worker {
        #[command(subcommand)]
        command: WorkerCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum PluginCommand {
    /// Scan the plugins directory and report what was admitted or rejected
    Load,
    /// List registry entries
    List,
    /// Enable a plugin (takes effect on the next start)
    Enable {
        /// Plugin identifier
        name: String,
    },
    /// Disable a plugin (takes effect on the next start)
    Disable {
        /// Plugin identifier
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Add a service category
    AddCategory { uri: String, name: String },
    /// Add a service sold through a provider plugin
    AddService {
        uri: String,
        name: String,
        /// Category URI
        category: String,
        /// Provider plugin identifier
        provider: String,
        /// Billing period in days
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum OrderCommand {
    /// Order a service
    Create {
        /// Ordering user id
        user: i64,
        /// Category URI
        category: String,
        /// Service URI
        service: String,
        /// Order fields as key=value
        fields: Vec<String>,
    },
    /// Show an order with its invoice and configuration
    Show { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum InvoiceCommand {
    /// Mark an invoice paid, queueing its order for deployment
    Pay { id: i64 },
    /// Cancel a pending invoice
    Cancel { id: i64 },
    /// Refund an invoice
    Refund { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum WorkerCommand {
    /// Run one fulfillment tick if the job is due
    Run {
        /// Run even when the job is not due; the run marker is left untouched
        #[arg(long)]
        force: bool,
    },
}
