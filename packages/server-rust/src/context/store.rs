//! Keyed store of correlation contexts for in-flight requests.
//!
//! Concurrent access goes through `DashMap`, so requests on different worker
//! threads never contend on a global lock. Entries are replaced wholesale on
//! `set` and copied on write by `update`, which keeps readers holding an
//! `Arc` snapshot unaffected by later changes.

use std::sync::Arc;

use dashmap::DashMap;
use selfservice_core::{ContextFields, CorrelationId};
use serde_json::Value;
use tracing::trace;

/// Process-memory store mapping correlation identifiers to their fields.
#[derive(Debug, Default)]
pub struct ContextStore {
    entries: DashMap<CorrelationId, Arc<ContextFields>>,
}

impl ContextStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Stores `fields` for `id`, silently replacing any previous entry.
    pub fn set(&self, id: &CorrelationId, fields: ContextFields) {
        self.entries.insert(id.clone(), Arc::new(fields));
    }

    /// Returns the fields stored for `id`, if any.
    #[must_use]
    pub fn get(&self, id: &CorrelationId) -> Option<Arc<ContextFields>> {
        self.entries.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Removes the entry for `id`. Clearing an absent entry is a no-op.
    pub fn clear(&self, id: &CorrelationId) {
        if self.entries.remove(id).is_some() {
            trace!(correlation_id = %id, "correlation context cleared");
        }
    }

    /// Sets a single field on an existing entry.
    ///
    /// Returns `false` without creating anything when `id` has no entry.
    pub fn update(&self, id: &CorrelationId, key: impl Into<String>, value: impl Into<Value>) -> bool {
        match self.entries.get_mut(id) {
            Some(mut entry) => {
                Arc::make_mut(entry.value_mut()).insert(key, value);
                true
            }
            None => false,
        }
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores `fields` for `id` and returns a guard that clears the entry
    /// when dropped.
    #[must_use]
    pub fn enter(self: &Arc<Self>, id: CorrelationId, fields: ContextFields) -> ContextEntryGuard {
        self.set(&id, fields);
        ContextEntryGuard {
            store: Arc::clone(self),
            id,
        }
    }
}

/// RAII guard owning one store entry for the duration of a request.
///
/// Dropped when the request future completes or is cancelled, so an aborted
/// connection cannot leave its entry behind.
#[derive(Debug)]
pub struct ContextEntryGuard {
    store: Arc<ContextStore>,
    id: CorrelationId,
}

impl ContextEntryGuard {
    #[must_use]
    pub fn id(&self) -> &CorrelationId {
        &self.id
    }
}

impl Drop for ContextEntryGuard {
    fn drop(&mut self) {
        self.store.clear(&self.id);
    }
}
