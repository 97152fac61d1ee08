use log::debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use uuid::Uuid;

/// Identifies one execution context (one `KeyedStore` handle) on an origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Source of events that originate outside this process.
    pub const EXTERNAL: ContextId = ContextId(Uuid::nil());

    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn is_external(&self) -> bool {
        *self == Self::EXTERNAL
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document changed. `new_value` is `None` when the key was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
    pub source: ContextId,
}

pub type Callback = Arc<dyn Fn(&StorageEvent) + Send + Sync>;

struct Listener {
    id: u64,
    context: ContextId,
    callback: Callback,
}

/// Observer registry shared by every context of one storage origin.
#[derive(Default)]
pub struct ChangeBus {
    next_id: AtomicU64,
    listeners: Mutex<Vec<Listener>>,
}

impl ChangeBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(self: &Arc<Self>, context: ContextId, callback: Callback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Listener { id, context, callback });

        Subscription {
            id,
            bus: Arc::downgrade(self),
            active: AtomicBool::new(true),
        }
    }

    /// Delivers `event` to every listener not owned by `event.source`.
    pub fn publish(&self, event: &StorageEvent) {
        // Snapshot first: callbacks may subscribe or save re-entrantly.
        let targets: Vec<Callback> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|listener| listener.context != event.source)
            .map(|listener| Arc::clone(&listener.callback))
            .collect();

        debug!(
            "storage event for '{}' from {} -> {} listener(s)",
            event.key,
            event.source,
            targets.len()
        );

        for callback in targets {
            callback(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn remove(&self, id: u64) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|listener| listener.id != id);
    }
}

/// Disposer returned by `subscribe`. Dropping it also unsubscribes.
pub struct Subscription {
    id: u64,
    bus: Weak<ChangeBus>,
    active: AtomicBool,
}

impl Subscription {
    /// Deregisters the callback. Further calls are no-ops.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
