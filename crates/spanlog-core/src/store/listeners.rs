//! Store-owned listener registry.
//!
//! The store keeps weak references only: a listener that is dropped
//! elsewhere simply stops receiving events and is pruned on the next
//! registry operation.

use std::fmt;
use std::sync::{Arc, Weak};

/// What changed in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogUpdateAction {
    /// New segments were appended; an incremental read is enough.
    Append,
    /// Content was removed and lines re-indexed; readers must reset.
    Truncate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogUpdateEvent {
    pub action: LogUpdateAction,
}

impl LogUpdateEvent {
    pub const fn append() -> Self {
        Self {
            action: LogUpdateAction::Append,
        }
    }

    pub const fn truncate() -> Self {
        Self {
            action: LogUpdateAction::Truncate,
        }
    }
}

/// Receiver of store change notifications.
///
/// Called synchronously, in registration order. Implementations must not
/// append to the store they are listening on from inside the callback.
pub trait LogUpdateListener: Send + Sync {
    fn on_log_update(&self, event: &LogUpdateEvent);
}

/// Registration handle returned by `add_listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Default)]
pub(crate) struct ListenerSet {
    entries: Vec<(ListenerId, Weak<dyn LogUpdateListener>)>,
    next_id: u64,
}

impl ListenerSet {
    /// Register `listener`. Registering the same object twice returns the
    /// existing id.
    pub(crate) fn add(&mut self, listener: &Arc<dyn LogUpdateListener>) -> ListenerId {
        self.prune();
        let weak = Arc::downgrade(listener);
        if let Some((id, _)) = self
            .entries
            .iter()
            .find(|(_, existing)| Weak::ptr_eq(existing, &weak))
        {
            return *id;
        }

        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, weak));
        id
    }

    /// Unregister. Returns false if `id` was not registered.
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        self.prune();
        self.entries.len() != before
    }

    /// Strong references to every live listener, in registration order.
    pub(crate) fn live(&self) -> Vec<Arc<dyn LogUpdateListener>> {
        self.entries
            .iter()
            .filter_map(|(_, weak)| weak.upgrade())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    fn prune(&mut self) {
        self.entries.retain(|(_, weak)| weak.strong_count() > 0);
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

/// Deliver `events` to `listeners` in order.
pub(crate) fn notify(listeners: &[Arc<dyn LogUpdateListener>], events: &[LogUpdateEvent]) {
    for event in events {
        for listener in listeners {
            listener.on_log_update(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<LogUpdateAction>>,
    }

    impl LogUpdateListener for Recorder {
        fn on_log_update(&self, event: &LogUpdateEvent) {
            self.events.lock().unwrap().push(event.action);
        }
    }

    #[test]
    fn test_duplicate_registration_returns_same_id() {
        let mut set = ListenerSet::default();
        let listener: Arc<dyn LogUpdateListener> = Arc::new(Recorder::default());

        let a = set.add(&listener);
        let b = set.add(&listener);
        assert_eq!(a, b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut set = ListenerSet::default();
        let listener: Arc<dyn LogUpdateListener> = Arc::new(Recorder::default());
        let id = set.add(&listener);

        assert!(set.remove(id));
        assert!(!set.remove(id));
        assert!(set.live().is_empty());
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let mut set = ListenerSet::default();
        let kept = Arc::new(Recorder::default());
        let kept_dyn: Arc<dyn LogUpdateListener> = kept.clone();
        set.add(&kept_dyn);
        {
            let dropped: Arc<dyn LogUpdateListener> = Arc::new(Recorder::default());
            set.add(&dropped);
        }

        assert_eq!(set.len(), 1);
        notify(&set.live(), &[LogUpdateEvent::append()]);
        assert_eq!(*kept.events.lock().unwrap(), vec![LogUpdateAction::Append]);
    }
}
