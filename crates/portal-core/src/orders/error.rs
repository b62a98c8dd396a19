//! # Portal Core Order Errors
//!
//! Order creation fails before any write for every variant except
//! [`OrderError::Persistence`]. Each variant carries a stable client-facing
//! code for the request layer.
use thiserror::Error;

use crate::orders::state::TransitionError;
use crate::storage::error::StorageSystemError;
use crate::storage::models::RowId;

pub const ERR_SERVICE_NOT_FOUND: &str = "ERR_SERVICE_NOT_FOUND";
pub const ERR_CATEGORY_NOT_FOUND: &str = "ERR_CATEGORY_NOT_FOUND";
pub const ERR_PROVIDER_NOT_FOUND: &str = "ERR_PROVIDER_NOT_FOUND";
pub const ERR_MISSING_REQUIRED_FIELD: &str = "ERR_MISSING_REQUIRED_FIELD";
pub const ERR_ORDER_NOT_FOUND: &str = "ERR_ORDER_NOT_FOUND";
pub const ERR_INVOICE_NOT_FOUND: &str = "ERR_INVOICE_NOT_FOUND";
pub const ERR_INVALID_TRANSITION: &str = "ERR_INVALID_TRANSITION";
pub const ERR_PERSISTENCE: &str = "ERR_PERSISTENCE";

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Service '{0}' not found")]
    ServiceNotFound(String),

    #[error("Category '{0}' not found")]
    CategoryNotFound(String),

    #[error("No loaded provider for service '{0}'")]
    ProviderNotFound(String),

    #[error("Missing required field '{0}'")]
    MissingRequiredField(String),

    #[error("Order {0} not found")]
    OrderNotFound(RowId),

    #[error("Invoice {0} not found")]
    InvoiceNotFound(RowId),

    #[error(transparent)]
    InvalidTransition(TransitionError),

    #[error("Persistence failure: {0}")]
    Persistence(StorageSystemError),
}

impl From<StorageSystemError> for OrderError {
    fn from(err: StorageSystemError) -> Self {
        match err {
            StorageSystemError::InvalidTransition(transition) => OrderError::InvalidTransition(transition),
            other => OrderError::Persistence(other),
        }
    }
}

impl OrderError {
    pub fn code(&self) -> &'static str {
        match self {
            OrderError::ServiceNotFound(_) => ERR_SERVICE_NOT_FOUND,
            OrderError::CategoryNotFound(_) => ERR_CATEGORY_NOT_FOUND,
            OrderError::ProviderNotFound(_) => ERR_PROVIDER_NOT_FOUND,
            OrderError::MissingRequiredField(_) => ERR_MISSING_REQUIRED_FIELD,
            OrderError::OrderNotFound(_) => ERR_ORDER_NOT_FOUND,
            OrderError::InvoiceNotFound(_) => ERR_INVOICE_NOT_FOUND,
            OrderError::InvalidTransition(_) => ERR_INVALID_TRANSITION,
            OrderError::Persistence(_) => ERR_PERSISTENCE,
        }
    }

    /// The offending field of a `MissingRequiredField`.
    pub fn field(&self) -> Option<&str> {
        match self {
            OrderError::MissingRequiredField(field) => Some(field),
            _ => None,
        }
    }
}
