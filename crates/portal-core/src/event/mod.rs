//! # Portal Core Event System
//!
//! A synchronous, name-keyed publish/subscribe bus. Plugins subscribe during
//! load through [`Plugin::register_events`](crate::plugin_system::Plugin::register_events);
//! the loader, order manager and fulfillment worker emit lifecycle events.
//!
//! Event names are namespaced strings (`domain::Verb`); the ones the core
//! emits live in [`types`]. Payloads are positional `serde_json::Value` lists.
pub mod bus;
pub mod error;
pub mod types;

pub use bus::{EmitOutcome, EventBus, Listener, ListenerError, ListenerId, ListenerResult};
pub use error::EventSystemError;
pub use types::SystemEvent;

// Test module declaration
#[cfg(test)]
mod tests;
