//! Audit log plugin.
//!
//! Subscribes to the lifecycle events the core emits and keeps every
//! occurrence, with its payload, in an [`AuditTrail`].
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use log::info;
use portal_core::event::EventBus;
use portal_core::event::types::{
    APP_LOAD, INVOICE_CANCELLED, INVOICE_PAID, INVOICE_REFUNDED, ORDER_CREATED, ORDER_DEPLOYED, ORDER_DEPLOYING,
    ORDER_FAILED, ORDER_PROCESSED, PLUGIN_LOADED,
};
use portal_core::plugin_system::Plugin;
use portal_core::plugin_system::error::PluginSystemError;
use serde_json::Value;

pub const IDENTIFIER: &str = "audit_log";

/// Events the trail subscribes to.
pub const AUDITED_EVENTS: [&str; 10] = [
    APP_LOAD,
    PLUGIN_LOADED,
    ORDER_CREATED,
    ORDER_PROCESSED,
    ORDER_DEPLOYING,
    ORDER_DEPLOYED,
    ORDER_FAILED,
    INVOICE_PAID,
    INVOICE_CANCELLED,
    INVOICE_REFUNDED,
];

#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub event: String,
    pub args: Vec<Value>,
    pub at: DateTime<Utc>,
}

/// Shared, append-only list of audited events.
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: &str, args: &[Value]) {
        let record = AuditRecord {
            event: event.to_string(),
            args: args.to_vec(),
            at: Utc::now(),
        };
        self.records.lock().unwrap_or_else(PoisonError::into_inner).push(record);
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Records of one event, oldest first.
    pub fn of(&self, event: &str) -> Vec<AuditRecord> {
        self.records().into_iter().filter(|r| r.event == event).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct AuditLogPlugin {
    trail: AuditTrail,
}

impl AuditLogPlugin {
    pub fn with_trail(trail: AuditTrail) -> Self {
        Self { trail }
    }

    pub fn trail(&self) -> &AuditTrail {
        &self.trail
    }
}

impl Plugin for AuditLogPlugin {
    fn identifier(&self) -> &str {
        IDENTIFIER
    }

    fn register_events(&self, bus: &EventBus) -> Result<(), PluginSystemError> {
        for event in AUDITED_EVENTS {
            let trail = self.trail.clone();
            bus.on(event, move |args| {
                info!("[AuditLog] {} {}", event, Value::Array(args.to_vec()));
                trail.record(event, args);
                Ok(())
            });
        }
        Ok(())
    }
}

/// Catalog factory. Each instance gets its own trail.
pub fn factory() -> Box<dyn Plugin> {
    Box::new(AuditLogPlugin::default())
}

#[cfg(test)]
mod tests;
