use crate::notify::UpdateListener;
use arc_swap::ArcSwap;
use derive_more::Display;
use std::sync::{
    Arc, Weak,
    atomic::{AtomicU64, Ordering},
};

///
/// ListenerId
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("listener#{_0}")]
pub struct ListenerId(u64);

///
/// Registered
///

#[derive(Clone)]
pub(crate) struct Registered {
    pub(crate) id: ListenerId,
    pub(crate) listener: Arc<dyn UpdateListener>,
}

///
/// ListenerRegistry
///
/// Copy-on-write listener list. Readers take a snapshot without locking;
/// writers swap in a new list.
///

pub(crate) struct ListenerRegistry {
    listeners: ArcSwap<Vec<Registered>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            listeners: ArcSwap::from_pointee(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn insert(&self, listener: Arc<dyn UpdateListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));

        self.listeners.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Registered {
                id,
                listener: Arc::clone(&listener),
            });
            next
        });

        id
    }

    /// Remove a listener; returns whether it was still registered.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let previous = self.listeners.rcu(|current| {
            current
                .iter()
                .filter(|registered| registered.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });

        previous.iter().any(|registered| registered.id == id)
    }

    pub(crate) fn clear(&self) -> usize {
        self.listeners.swap(Arc::new(Vec::new())).len()
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Registered>> {
        self.listeners.load_full()
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.load().len()
    }

    pub(crate) fn contains(&self, id: ListenerId) -> bool {
        self.listeners
            .load()
            .iter()
            .any(|registered| registered.id == id)
    }
}

///
/// ListenerHandle
///
/// Reversible registration. The handle does not keep the registry alive;
/// once the owning repository is gone `unregister` is a no-op.
///

#[derive(Clone, Debug)]
pub struct ListenerHandle {
    id: ListenerId,
    registry: Weak<ListenerRegistry>,
}

impl ListenerHandle {
    pub(crate) fn new(id: ListenerId, registry: &Arc<ListenerRegistry>) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ListenerId {
        self.id
    }

    /// Stop delivering events to this listener.
    ///
    /// Jobs already queued for it still run; nothing new is dispatched.
    /// Returns `false` if the listener was already gone.
    pub fn unregister(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.id))
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains(self.id))
    }
}
