//! # Portal Core Worker Errors
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::error::StorageSystemError;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid interval '{input}': {reason}")]
    InvalidInterval { input: String, reason: String },

    #[error("Invalid job id '{0}'")]
    InvalidJobId(String),

    #[error("Marker I/O for job '{job_id}' at '{path}': {source}")]
    MarkerIo {
        job_id: String,
        path: PathBuf,
        #[source]
        source: StorageSystemError,
    },

    #[error("Marker for job '{job_id}' is unreadable: {message}")]
    MarkerCorrupt { job_id: String, message: String },

    #[error("Job '{job_id}' failed: {source}")]
    JobFailed {
        job_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Worker storage error: {0}")]
    Storage(#[from] StorageSystemError),
}
