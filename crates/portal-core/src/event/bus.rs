use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::event::error::EventSystemError;
use crate::event::types::SystemEvent;

/// Handle returned by [`EventBus::on`], used to remove the listener again.
pub type ListenerId = u64;

pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

pub type ListenerResult = Result<(), ListenerError>;

/// A listener receives the positional arguments passed to `emit`.
pub type Listener = Arc<dyn Fn(&[Value]) -> ListenerResult + Send + Sync>;

struct Registration {
    id: ListenerId,
    listener: Listener,
}

#[derive(Default)]
struct BusState {
    next_id: ListenerId,
    events: HashMap<String, Vec<Registration>>,
}

/// Result of a single [`EventBus::emit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitOutcome {
    /// Listeners called, failed ones included.
    pub invoked: usize,
    pub failures: Vec<EventSystemError>,
}

impl EmitOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// In-process publish/subscribe bus.
///
/// Cloning is cheap and every clone shares the same listener table, so the
/// application hands one bus to the loader, the plugins, the order manager
/// and the worker.
#[derive(Clone, Default)]
pub struct EventBus {
    state: Arc<RwLock<BusState>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count(None))
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to `event_name`. Listeners run in registration order.
    pub fn on<F>(&self, event_name: &str, listener: F) -> ListenerId
    where
        F: Fn(&[Value]) -> ListenerResult + Send + Sync + 'static,
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.next_id += 1;
        let id = state.next_id;
        state
            .events
            .entry(event_name.to_string())
            .or_default()
            .push(Registration {
                id,
                listener: Arc::new(listener),
            });
        log::debug!("[EventBus] Listener {} registered for '{}'", id, event_name);
        id
    }

    /// Returns whether the listener was registered.
    pub fn remove_listener(&self, event_name: &str, id: ListenerId) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let Some(registrations) = state.events.get_mut(event_name) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        let removed = registrations.len() != before;
        if registrations.is_empty() {
            state.events.remove(event_name);
        }
        removed
    }

    /// Drop every listener of `event_name`, or of every event when `None`.
    pub fn remove_all_listeners(&self, event_name: Option<&str>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match event_name {
            Some(name) => {
                state.events.remove(name);
            }
            None => state.events.clear(),
        }
    }

    /// Listeners of `event_name` in registration order. With `None`, every
    /// listener on the bus, ordered by registration.
    pub fn listeners(&self, event_name: Option<&str>) -> Vec<Listener> {
        self.snapshot(event_name)
            .into_iter()
            .map(|(_, listener)| listener)
            .collect()
    }

    pub fn listener_count(&self, event_name: Option<&str>) -> usize {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match event_name {
            Some(name) => state.events.get(name).map_or(0, Vec::len),
            None => state.events.values().map(Vec::len).sum(),
        }
    }

    /// Id of the most recent registration. Pass it to
    /// [`remove_listeners_since`](Self::remove_listeners_since) to undo every
    /// registration made after this point.
    pub fn checkpoint(&self) -> ListenerId {
        self.state.read().unwrap_or_else(PoisonError::into_inner).next_id
    }

    /// Remove every listener registered after `checkpoint`. Returns how many
    /// were removed.
    pub fn remove_listeners_since(&self, checkpoint: ListenerId) -> usize {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = 0;
        for registrations in state.events.values_mut() {
            let before = registrations.len();
            registrations.retain(|r| r.id <= checkpoint);
            removed += before - registrations.len();
        }
        state.events.retain(|_, registrations| !registrations.is_empty());
        if removed > 0 {
            log::debug!("[EventBus] Removed {} listener(s) registered after {}", removed, checkpoint);
        }
        removed
    }

    /// Call every listener of `event_name` with `args`.
    ///
    /// The listener list is copied before the first call, so listeners may
    /// add or remove listeners (themselves included) without affecting this
    /// emit. A listener that errors or panics is recorded and the remaining
    /// listeners still run.
    pub fn emit(&self, event_name: &str, args: &[Value]) -> EmitOutcome {
        let snapshot = self.snapshot(Some(event_name));
        let mut outcome = EmitOutcome::default();

        for (id, listener) in snapshot {
            outcome.invoked += 1;
            match catch_unwind(AssertUnwindSafe(|| listener(args))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    log::warn!("[EventBus] Listener {} for '{}' failed: {}", id, event_name, err);
                    outcome.failures.push(EventSystemError::ListenerFailed {
                        event_name: event_name.to_string(),
                        listener: id,
                        message: err.to_string(),
                    });
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    log::error!("[EventBus] Listener {} for '{}' panicked: {}", id, event_name, message);
                    outcome.failures.push(EventSystemError::ListenerPanicked {
                        event_name: event_name.to_string(),
                        listener: id,
                        message,
                    });
                }
            }
        }
        outcome
    }

    pub fn emit_event(&self, event: &SystemEvent) -> EmitOutcome {
        self.emit(event.name(), &event.args())
    }

    fn snapshot(&self, event_name: Option<&str>) -> Vec<(ListenerId, Listener)> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut listeners: Vec<(ListenerId, Listener)> = match event_name {
            Some(name) => state
                .events
                .get(name)
                .map(|regs| regs.iter().map(|r| (r.id, Arc::clone(&r.listener))).collect())
                .unwrap_or_default(),
            None => state
                .events
                .values()
                .flatten()
                .map(|r| (r.id, Arc::clone(&r.listener)))
                .collect(),
        };
        if event_name.is_none() {
            listeners.sort_by_key(|(id, _)| *id);
        }
        listeners
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
