//! Thread-safe handle around a [`LogStore`].
//!
//! Mutations run under the write lock; listeners are notified after it is
//! released so they can read the store from inside their callback.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::{AppendBatch, Checkpoint};
use crate::settings::Settings;

use super::LogStore;
use super::listeners::{ListenerId, LogUpdateListener, notify};

/// Cloneable, shared log store (reader / single-writer).
#[derive(Debug, Clone, Default)]
pub struct SharedLogStore {
    inner: Arc<RwLock<LogStore>>,
}

impl SharedLogStore {
    pub fn new(store: LogStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn with_settings(settings: &Settings) -> Self {
        Self::new(LogStore::with_settings(settings))
    }

    /// Acquire a read guard for queries.
    pub fn read(&self) -> RwLockReadGuard<'_, LogStore> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LogStore> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ingest a batch, then notify listeners outside the lock.
    pub fn append(&self, batch: impl Into<AppendBatch>) -> Checkpoint {
        let (events, listeners, checkpoint) = {
            let mut store = self.write();
            let events = store.apply_append(batch.into());
            (events, store.live_listeners(), store.checkpoint())
        };
        notify(&listeners, &events);
        checkpoint
    }

    pub fn remove_spans<S: AsRef<str>>(&self, span_ids: &[S]) {
        let (events, listeners) = {
            let mut store = self.write();
            let events = store.apply_remove_spans(span_ids);
            (events, store.live_listeners())
        };
        notify(&listeners, &events);
    }

    pub fn add_listener(&self, listener: &Arc<dyn LogUpdateListener>) -> ListenerId {
        self.write().add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.write().remove_listener(id)
    }

    /// Whether both handles point at the same store.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<LogStore> for SharedLogStore {
    fn from(store: LogStore) -> Self {
        Self::new(store)
    }
}
