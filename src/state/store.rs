use std::sync::{Arc, Mutex, Weak};

use super::model::PlaybackState;

type Observer = Box<dyn Fn(&PlaybackState) + Send + 'static>;

struct Registry {
    next_id: u64,
    observers: Vec<(u64, Observer)>,
}

/// Single source of truth for playback state.
///
/// All mutation goes through [`StateStore::update`]: the change is applied
/// under the state lock and every registered observer is synchronously handed
/// the new snapshot before `update` returns. Only the engine thread mutates,
/// so observers never see partial or out-of-order states.
///
/// Observer callbacks run while the registry lock is held; they must not
/// subscribe or unsubscribe from inside the callback. Reading state through
/// [`StateStore::snapshot`] from a callback is fine.
pub struct StateStore {
    state: Mutex<PlaybackState>,
    registry: Mutex<Registry>,
}

impl StateStore {
    pub fn new(initial: PlaybackState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(initial),
            registry: Mutex::new(Registry {
                next_id: 0,
                observers: Vec::new(),
            }),
        })
    }

    /// Current snapshot, independent of any subscription.
    pub fn snapshot(&self) -> PlaybackState {
        self.state.lock().unwrap().clone()
    }

    /// Apply a mutation and fan the resulting snapshot out to every observer.
    pub fn update(&self, apply: impl FnOnce(&mut PlaybackState)) {
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            apply(&mut state);
            state.clone()
        };
        let registry = self.registry.lock().unwrap();
        for (_, observer) in registry.observers.iter() {
            observer(&snapshot);
        }
    }

    /// Register an observer and immediately hand it the current snapshot, so
    /// a late subscriber never misses the present state.
    pub fn subscribe(
        self: &Arc<Self>,
        observer: impl Fn(&PlaybackState) + Send + 'static,
    ) -> Subscription {
        let mut registry = self.registry.lock().unwrap();
        let id = registry.next_id;
        registry.next_id += 1;
        // Initial delivery happens with the registry held, so no update can
        // slip between the snapshot and the registration.
        let snapshot = self.snapshot();
        observer(&snapshot);
        registry.observers.push((id, Box::new(observer)));
        Subscription {
            id,
            store: Arc::downgrade(self),
        }
    }

    /// Drop every registered observer. Called during engine teardown so no
    /// late device event can reach an observer of a destroyed player.
    pub fn clear_observers(&self) {
        self.registry.lock().unwrap().observers.clear();
    }

    fn remove(&self, id: u64) {
        self.registry
            .lock()
            .unwrap()
            .observers
            .retain(|(oid, _)| *oid != id);
    }
}

/// Disposer for one observer registration.
///
/// The subscription's lifetime is the caller's responsibility: call
/// [`Subscription::unsubscribe`] (idempotent, safe to repeat) or simply drop
/// the handle.
pub struct Subscription {
    id: u64,
    store: Weak<StateStore>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if let Some(store) = self.store.upgrade() {
            store.remove(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
