use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::storage::local::{read_optional, write_atomic};
use crate::worker::error::WorkerError;

/// Persists the last successful run of each job.
///
/// Markers are local to one host. Two workers on different hosts sharing a
/// store can both consider a job due.
pub trait MarkerStore: Send + Sync {
    fn last_run(&self, job_id: &str) -> Result<Option<DateTime<Utc>>, WorkerError>;

    fn mark_run(&self, job_id: &str, at: DateTime<Utc>) -> Result<(), WorkerError>;
}

/// Job ids become file names, so they are restricted to `[A-Za-z0-9_-]`.
pub fn validate_job_id(job_id: &str) -> Result<(), WorkerError> {
    let valid = !job_id.is_empty()
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(WorkerError::InvalidJobId(job_id.to_string()))
    }
}

/// One `<job-id>.lastrun` file per job holding an RFC 3339 timestamp,
/// replaced atomically on every mark.
#[derive(Debug, Clone)]
pub struct FileMarkerStore {
    dir: PathBuf,
}

impl FileMarkerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn marker_path(&self, job_id: &str) -> Result<PathBuf, WorkerError> {
        validate_job_id(job_id)?;
        Ok(self.dir.join(format!("{}.lastrun", job_id)))
    }
}

impl MarkerStore for FileMarkerStore {
    fn last_run(&self, job_id: &str) -> Result<Option<DateTime<Utc>>, WorkerError> {
        let path = self.marker_path(job_id)?;
        let Some(bytes) = read_optional(&path).map_err(|source| WorkerError::MarkerIo {
            job_id: job_id.to_string(),
            path: path.clone(),
            source,
        })?
        else {
            return Ok(None);
        };

        let text = String::from_utf8_lossy(&bytes);
        DateTime::parse_from_rfc3339(text.trim())
            .map(|at| Some(at.with_timezone(&Utc)))
            .map_err(|e| WorkerError::MarkerCorrupt {
                job_id: job_id.to_string(),
                message: e.to_string(),
            })
    }

    fn mark_run(&self, job_id: &str, at: DateTime<Utc>) -> Result<(), WorkerError> {
        let path = self.marker_path(job_id)?;
        write_atomic(&path, at.to_rfc3339().as_bytes()).map_err(|source| WorkerError::MarkerIo {
            job_id: job_id.to_string(),
            path,
            source,
        })
    }
}

/// Markers kept in memory, for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    runs: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn last_run(&self, job_id: &str) -> Result<Option<DateTime<Utc>>, WorkerError> {
        let runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(runs.get(job_id).copied())
    }

    fn mark_run(&self, job_id: &str, at: DateTime<Utc>) -> Result<(), WorkerError> {
        validate_job_id(job_id)?;
        let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        runs.insert(job_id.to_string(), at);
        Ok(())
    }
}
