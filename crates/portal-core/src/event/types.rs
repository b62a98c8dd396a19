use serde_json::{Value, json};

use crate::orders::state::{InvoiceStatus, OrderStatus};
use crate::storage::models::RowId;

// Application lifecycle
pub const APP_LOAD: &str = "app::Load";
pub const ROUTER_READY: &str = "router::Ready";
pub const PLUGIN_LOADED: &str = "plugin::Loaded";

// Auth lifecycle. Emitted by the request layer; the core only names them.
pub const AUTH_LOGIN_SUCCESS: &str = "auth::LoginSuccess";
pub const AUTH_LOGIN_FAILURE: &str = "auth::LoginFailure";
pub const AUTH_REGISTER_SUCCESS: &str = "auth::RegisterSuccess";
pub const AUTH_REGISTER_FAILURE: &str = "auth::RegisterFailure";
pub const AUTH_FORGOT_PASSWORD_SUCCESS: &str = "auth::ForgotPasswordSuccess";
pub const AUTH_FORGOT_PASSWORD_FAILURE: &str = "auth::ForgotPasswordFailure";

// Orders, args: [order id, provider identifier]
pub const ORDER_CREATED: &str = "order::Created";
pub const ORDER_PROCESSED: &str = "order::Processed";
pub const ORDER_DEPLOYING: &str = "order::Deploying";
pub const ORDER_DEPLOYED: &str = "order::Deployed";
pub const ORDER_FAILED: &str = "order::Failed";

// Invoices, args: [invoice id, order id]
pub const INVOICE_PAID: &str = "invoice::Paid";
pub const INVOICE_CANCELLED: &str = "invoice::Cancelled";
pub const INVOICE_REFUNDED: &str = "invoice::Refunded";

/// Events emitted by the core itself, with their positional payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemEvent {
    /// A load pass finished
    ApplicationLoad { plugins: Vec<String> },
    /// A plugin was admitted
    PluginLoaded { plugin_id: String },
    /// An order entered `status` (including creation in `processing`)
    OrderStatusChanged {
        order_id: RowId,
        provider: String,
        status: OrderStatus,
    },
    /// An invoice left `pending`, or a paid one was refunded
    InvoiceSettled {
        invoice_id: RowId,
        order_id: RowId,
        status: InvoiceStatus,
    },
}

impl SystemEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SystemEvent::ApplicationLoad { .. } => APP_LOAD,
            SystemEvent::PluginLoaded { .. } => PLUGIN_LOADED,
            SystemEvent::OrderStatusChanged { status, .. } => status.event_name(),
            // no invoice edge leads to pending
            SystemEvent::InvoiceSettled { status, .. } => status.event_name().unwrap_or(INVOICE_PAID),
        }
    }

    pub fn args(&self) -> Vec<Value> {
        match self {
            SystemEvent::ApplicationLoad { plugins } => vec![json!(plugins)],
            SystemEvent::PluginLoaded { plugin_id } => vec![json!(plugin_id)],
            SystemEvent::OrderStatusChanged { order_id, provider, .. } => {
                vec![json!(order_id), json!(provider)]
            }
            SystemEvent::InvoiceSettled { invoice_id, order_id, .. } => {
                vec![json!(invoice_id), json!(order_id)]
            }
        }
    }
}
