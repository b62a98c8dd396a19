//! # Portal Core Kernel Errors
//!
//! [`Error`] aggregates the typed errors of every subsystem so the binary and
//! the [`Application`](crate::kernel::Application) context can use a single
//! `Result` alias while callers can still match on the specific variant.
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::orders::error::OrderError;
use crate::plugin_system::error::PluginSystemError;
use crate::storage::error::StorageSystemError;
use crate::worker::error::WorkerError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    #[error("Storage system error: {0}")]
    StorageSystem(#[from] StorageSystemError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl Error {
    /// Wraps an I/O failure with the operation and path it happened on.
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        Error::StorageSystem(StorageSystemError::io(source, operation, path))
    }

    /// Client-facing code, when the error maps onto one.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Error::Order(err) => Some(err.code()),
            Error::StorageSystem(_) => Some(crate::orders::error::ERR_PERSISTENCE),
            _ => None,
        }
    }
}
