//! Typed publish/subscribe channel between the simulation and its observers.
//!
//! Delivery is synchronous: `publish` runs every listener registered for the
//! event's type, in registration order, on the calling thread. Listeners
//! that need another execution context must hand the event off themselves.
//!
//! Publishing from several threads is allowed. The registry lock is released
//! before listeners run and each listener sits behind its own mutex, so a
//! given listener never runs concurrently with itself; across threads the
//! delivery order is the order in which `publish` calls reach that
//! listener. A listener must not publish an event type it listens to.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<E> = Mutex<Box<dyn FnMut(&E) + Send>>;

struct Entry {
    id: SubscriptionId,
    /// A `Listener<E>` for the `TypeId` this entry is filed under.
    listener: Arc<dyn Any + Send + Sync>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    by_type: HashMap<TypeId, Vec<Entry>>,
}

#[derive(Default)]
pub struct EventBus {
    registry: Mutex<Registry>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.lock();
        let listeners: usize = registry.by_type.values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("event_types", &registry.by_type.len())
            .field("listeners", &listeners)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for events of type `E`. It stays registered until
    /// `unsubscribe` is called with the returned id.
    pub fn subscribe<E, F>(&self, listener: F) -> SubscriptionId
    where
        E: Any,
        F: FnMut(&E) + Send + 'static,
    {
        let boxed: Box<dyn FnMut(&E) + Send> = Box::new(listener);
        let listener: Arc<Listener<E>> = Arc::new(Mutex::new(boxed));

        let mut registry = self.lock();
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry
            .by_type
            .entry(TypeId::of::<E>())
            .or_default()
            .push(Entry { id, listener });
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.lock();
        for entries in registry.by_type.values_mut() {
            if let Some(pos) = entries.iter().position(|e| e.id == id) {
                entries.remove(pos);
                return true;
            }
        }
        false
    }

    /// Deliver `event` to every listener of its type.
    pub fn publish<E: Any>(&self, event: E) {
        let listeners: Vec<Arc<dyn Any + Send + Sync>> = {
            let registry = self.lock();
            match registry.by_type.get(&TypeId::of::<E>()) {
                Some(entries) => entries.iter().map(|e| e.listener.clone()).collect(),
                None => return,
            }
        };

        for listener in listeners {
            let Some(listener) = listener.downcast_ref::<Listener<E>>() else {
                unreachable!("listener filed under the wrong event type");
            };
            let mut guard = listener.lock().unwrap_or_else(|p| p.into_inner());
            let call: &mut (dyn FnMut(&E) + Send) = &mut **guard;
            call(&event);
        }
    }

    pub fn listener_count<E: Any>(&self) -> usize {
        self.lock()
            .by_type
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|p| p.into_inner())
    }
}
