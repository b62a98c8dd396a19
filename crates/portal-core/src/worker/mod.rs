//! # Portal Core Worker
//!
//! Periodic jobs and the fulfillment worker.
//!
//! - **Schedule** (`schedule`): [`Interval`] parsed from `<n><unit>`.
//! - **Markers** (`marker`): last-run timestamps per job id, on disk or in memory.
//! - **Cron** (`cron`): [`CronJob`] with `should_run` and `run_if_due`.
//! - **Fulfillment** (`fulfillment`): [`FulfillmentWorker`] moving `processed`
//!   orders through `deploying` to `deployed` or `failed`.
pub mod cron;
pub mod error;
pub mod fulfillment;
pub mod marker;
pub mod schedule;

pub use cron::{CronJob, RunOutcome};
pub use error::WorkerError;
pub use fulfillment::{FulfillmentWorker, TickReport};
pub use marker::{FileMarkerStore, MarkerStore, MemoryMarkerStore};
pub use schedule::{Interval, IntervalUnit};

// Test module declaration
#[cfg(test)]
mod tests;
