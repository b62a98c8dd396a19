use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::worker::error::WorkerError;
use crate::worker::marker::{MarkerStore, validate_job_id};
use crate::worker::schedule::Interval;

/// What [`CronJob::run_if_due`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome<T> {
    NotDue { next_due: DateTime<Utc> },
    Ran(T),
}

impl<T> RunOutcome<T> {
    pub fn ran(&self) -> bool {
        matches!(self, RunOutcome::Ran(_))
    }
}

/// A periodic job guarded by a last-run marker.
///
/// A job is due when it has never run or when at least one interval has
/// passed since the last successful run. The marker is only written after
/// the callback succeeds, so a failed run is retried on the next trigger.
#[derive(Clone)]
pub struct CronJob {
    id: String,
    interval: Interval,
    markers: Arc<dyn MarkerStore>,
}

impl fmt::Debug for CronJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CronJob")
            .field("id", &self.id)
            .field("interval", &self.interval.to_string())
            .finish()
    }
}

impl CronJob {
    pub fn new(id: &str, interval: Interval, markers: Arc<dyn MarkerStore>) -> Result<Self, WorkerError> {
        validate_job_id(id)?;
        Ok(Self {
            id: id.to_string(),
            interval,
            markers,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn last_run(&self) -> Result<Option<DateTime<Utc>>, WorkerError> {
        self.markers.last_run(&self.id)
    }

    pub fn should_run(&self) -> Result<bool, WorkerError> {
        self.should_run_at(Utc::now())
    }

    pub fn should_run_at(&self, now: DateTime<Utc>) -> Result<bool, WorkerError> {
        Ok(self.next_due_at(now)? <= now)
    }

    /// Earliest time the job is due; `now` when it never ran.
    pub fn next_due_at(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, WorkerError> {
        let Some(last) = self.markers.last_run(&self.id)? else {
            return Ok(now);
        };
        let step = TimeDelta::from_std(self.interval.as_duration()).unwrap_or(TimeDelta::MAX);
        Ok(last.checked_add_signed(step).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    pub async fn run_if_due<F, Fut, T, E>(&self, callback: F) -> Result<RunOutcome<T>, WorkerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        self.run_if_due_at(Utc::now(), callback).await
    }

    /// Run `callback` if the job is due at `now`, and mark the job as run at
    /// `now` only when the callback returns `Ok`.
    pub async fn run_if_due_at<F, Fut, T, E>(&self, now: DateTime<Utc>, callback: F) -> Result<RunOutcome<T>, WorkerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let next_due = self.next_due_at(now)?;
        if next_due > now {
            log::debug!("[CronJob] '{}' not due until {}", self.id, next_due.to_rfc3339());
            return Ok(RunOutcome::NotDue { next_due });
        }

        log::info!("[CronJob] Running '{}' (every {})", self.id, self.interval);
        match callback().await {
            Ok(value) => {
                self.markers.mark_run(&self.id, now)?;
                Ok(RunOutcome::Ran(value))
            }
            Err(e) => {
                let source = e.into();
                log::error!("[CronJob] '{}' failed, marker left untouched: {}", self.id, source);
                Err(WorkerError::JobFailed {
                    job_id: self.id.clone(),
                    source,
                })
            }
        }
    }
}
