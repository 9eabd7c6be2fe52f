//! Listener registry

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use super::event::{CollectionEvent, CollectionEventArgs};

/// Receives dispatched events
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: CollectionEvent, args: &CollectionEventArgs<'_>);
}

impl<F> EventListener for F
where
    F: Fn(CollectionEvent, &CollectionEventArgs<'_>) + Send + Sync,
{
    fn on_event(&self, event: CollectionEvent, args: &CollectionEventArgs<'_>) {
        self(event, args)
    }
}

/// What the gateway needs from an event mechanism
pub trait EventHub: Send + Sync {
    fn has_listeners(&self, event: CollectionEvent) -> bool;

    fn dispatch(&self, event: CollectionEvent, args: &CollectionEventArgs<'_>);
}

/// Listeners keyed by event, invoked in registration order.
#[derive(Default)]
pub struct EventManager {
    listeners: RwLock<HashMap<CollectionEvent, Vec<Arc<dyn EventListener>>>>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one listener for several events
    pub fn add_listener(&self, events: &[CollectionEvent], listener: Arc<dyn EventListener>) {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        for event in events {
            listeners.entry(*event).or_default().push(listener.clone());
        }
    }

    pub fn remove_listeners(&self, event: CollectionEvent) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&event);
    }

    pub fn listener_count(&self, event: CollectionEvent) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event)
            .map_or(0, Vec::len)
    }
}

impl EventHub for EventManager {
    fn has_listeners(&self, event: CollectionEvent) -> bool {
        self.listener_count(event) > 0
    }

    fn dispatch(&self, event: CollectionEvent, args: &CollectionEventArgs<'_>) {
        // Snapshot so listeners may register more listeners
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event)
            .cloned()
            .unwrap_or_default();

        for listener in listeners {
            listener.on_event(event, args);
        }
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<_, _> = listeners.iter().map(|(e, l)| (e.as_str(), l.len())).collect();
        f.debug_struct("EventManager").field("listeners", &counts).finish()
    }
}
