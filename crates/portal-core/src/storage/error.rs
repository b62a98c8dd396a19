//! # Portal Core Storage System Errors
//!
//! [`StorageSystemError`] covers file I/O for snapshots and configuration,
//! (de)serialization, and the row-level failures of the [`Store`](crate::storage::Store)
//! collaborator: missing rows, rejected status moves and lost compare-and-set races.
use std::path::PathBuf;
use thiserror::Error;

use crate::orders::state::{OrderStatus, TransitionError};
use crate::storage::models::RowId;

#[derive(Debug, Error)]
pub enum StorageSystemError {
    #[error("I/O error during operation '{operation}' on path '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization to '{format}' failed: {source}")]
    SerializationError {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Deserialization from '{format}' failed: {source}")]
    DeserializationError {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Unsupported configuration format: {0}")]
    UnsupportedConfigFormat(String),

    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("Order {order_id} expected status '{expected}' but found '{actual}'")]
    StaleStatus {
        order_id: RowId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    #[error("Registry entry '{0}' is locked")]
    Locked(String),

    #[error("Constraint violated: {0}")]
    Constraint(String),
}

// Helper for creating Io errors, ensuring path is always included.
impl StorageSystemError {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        StorageSystemError::Io {
            source,
            operation: operation.into(),
            path,
        }
    }

    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StorageSystemError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}
