//! # Portal Core Kernel
//!
//! The `kernel` module ties the subsystems together.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Application Context**: [`Application`](bootstrap::Application) owns the
//!   store, event bus, plugin registry, loader, resolver, order manager and
//!   fulfillment worker, and hands each one the collaborators it needs. There
//!   are no process-wide globals; callers thread the context explicitly.
//! - **Core Constants**: defaults and file names in the `constants` submodule.
//! - **Error Handling**: the aggregated [`Error`](error::Error) and the crate
//!   `Result` alias in the `error` submodule.
pub mod bootstrap;
pub mod constants;
pub mod error;

pub use bootstrap::Application;
pub use error::{Error, Result};

// Test module declaration
#[cfg(test)]
mod tests;
