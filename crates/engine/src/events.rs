//! Change notifications for setting writes.
//!
//! A registry emits one [`ChangeEvent`] per accepted write, synchronously
//! and in subscriber registration order. Subscribers are an explicit list:
//! consumers register a callback, keep the returned id, and unsubscribe
//! themselves when done (no weak references, no implicit lifetimes).

use std::sync::{Arc, Mutex};

use crate::value::Value;

/// Emitted after a setting's value has been stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Name of the setting that changed.
    pub name: String,
    /// The newly stored value.
    pub value: Value,
}

/// Callback type for receiving change events.
pub type ChangeCallback = Box<dyn FnMut(ChangeEvent) + Send>;

/// Handle identifying one subscription, for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Shared event collector for tests and simple consumers.
///
/// Clones share the same buffer, so one handle can be turned into a
/// callback and moved into a registry while another stays behind to
/// inspect what was emitted.
#[derive(Clone, Default)]
pub struct ChangeLog {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that appends every event to this log.
    pub fn callback(&self) -> ChangeCallback {
        let events = Arc::clone(&self.events);
        Box::new(move |event| {
            if let Ok(mut events) = events.lock() {
                events.push(event);
            }
        })
    }

    /// Snapshot of the events collected so far.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<ChangeEvent> {
        self.events.lock().ok().and_then(|e| e.last().cloned())
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}
