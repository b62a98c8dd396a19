//! # Portal Core Event System Errors
//!
//! Failures raised by listeners during [`EventBus::emit`](crate::event::EventBus::emit).
//! They are collected into the emit outcome instead of stopping the emit.
use crate::event::ListenerId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventSystemError {
    #[error("Listener {listener} for event '{event_name}' failed: {message}")]
    ListenerFailed {
        event_name: String,
        listener: ListenerId,
        message: String,
    },

    #[error("Listener {listener} for event '{event_name}' panicked: {message}")]
    ListenerPanicked {
        event_name: String,
        listener: ListenerId,
        message: String,
    },
}
