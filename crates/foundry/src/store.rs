//! Persistence collaborator interface and the in-memory default store.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::trace;
use uuid::Uuid;

use crate::error::FoundryResult;

/// Identifier the store assigns to a persisted record.
pub type RecordId = Uuid;

/// Durable storage for constructed objects, keyed by model name.
///
/// Records cross this boundary as JSON so one store serves every model type.
pub trait Persister: Send + Sync {
    /// Inserts `record` (when `id` is `None`) or overwrites the existing one.
    fn persist(&self, model: &str, id: Option<RecordId>, record: &Value)
    -> FoundryResult<RecordId>;

    /// Loads the current state of a record, if it still exists.
    fn fetch(&self, model: &str, id: RecordId) -> FoundryResult<Option<Value>>;

    /// Deletes a record. Returns false when it was already gone.
    fn remove(&self, model: &str, id: RecordId) -> FoundryResult<bool>;
}

/// A persisted record as kept by [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub model: String,
    pub id: RecordId,
    pub data: Value,
}

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<StoredRecord>,
    persist_calls: usize,
}

/// Process-local store that keeps records in insertion order.
///
/// Nested objects are persisted before their parents, so the insertion order
/// is also a valid foreign-key order when flushing to a database.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of records stored for `model`.
    pub fn count(&self, model: &str) -> usize {
        self.state()
            .records
            .iter()
            .filter(|r| r.model == model)
            .count()
    }

    /// Total number of records across all models.
    pub fn len(&self) -> usize {
        self.state().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `persist` calls received, inserts and updates alike.
    pub fn persist_calls(&self) -> usize {
        self.state().persist_calls
    }

    /// Data of every `model` record, in insertion order.
    pub fn records(&self, model: &str) -> Vec<Value> {
        self.state()
            .records
            .iter()
            .filter(|r| r.model == model)
            .map(|r| r.data.clone())
            .collect()
    }

    /// Copy of all records in insertion order.
    pub fn snapshot(&self) -> Vec<StoredRecord> {
        self.state().records.clone()
    }

    /// Removes every record and resets the call counter.
    pub fn clear(&self) {
        let mut state = self.state();
        state.records.clear();
        state.persist_calls = 0;
    }
}

impl Persister for InMemoryStore {
    fn persist(
        &self,
        model: &str,
        id: Option<RecordId>,
        record: &Value,
    ) -> FoundryResult<RecordId> {
        let mut state = self.state();
        state.persist_calls += 1;

        if let Some(id) = id
            && let Some(existing) = state
                .records
                .iter_mut()
                .find(|r| r.id == id && r.model == model)
        {
            trace!(model, %id, "updating record");
            existing.data = record.clone();
            return Ok(id);
        }

        let id = id.unwrap_or_else(Uuid::new_v4);
        trace!(model, %id, "inserting record");
        state.records.push(StoredRecord {
            model: model.to_string(),
            id,
            data: record.clone(),
        });
        Ok(id)
    }

    fn fetch(&self, model: &str, id: RecordId) -> FoundryResult<Option<Value>> {
        Ok(self
            .state()
            .records
            .iter()
            .find(|r| r.id == id && r.model == model)
            .map(|r| r.data.clone()))
    }

    fn remove(&self, model: &str, id: RecordId) -> FoundryResult<bool> {
        let mut state = self.state();
        let before = state.records.len();
        state.records.retain(|r| !(r.id == id && r.model == model));
        Ok(state.records.len() != before)
    }
}
