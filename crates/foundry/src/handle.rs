//! Owning wrapper around one constructed object.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::attributes::ResolvedAttributes;
use crate::error::{FoundryError, FoundryResult};
use crate::model::Model;
use crate::store::{Persister, RecordId};
use crate::value::{AttributeValue, BuiltObject};

/// A constructed object plus its link to the store.
///
/// When auto-refresh is on, callbacks run through
/// [`Handle::execute_callback`] see the stored state rather than whatever is
/// held in memory.
pub struct Handle<T: Model> {
    object: T,
    id: Option<RecordId>,
    auto_refresh: bool,
    persister: Arc<dyn Persister>,
}

impl<T: Model> Handle<T> {
    pub fn new(object: T, persister: Arc<dyn Persister>, auto_refresh: bool) -> Self {
        Self {
            object,
            id: None,
            auto_refresh,
            persister,
        }
    }

    pub fn object(&self) -> &T {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut T {
        &mut self.object
    }

    pub fn into_object(self) -> T {
        self.object
    }

    /// The object as a plain attribute value, leaving the handle in place.
    ///
    /// Use this to point several objects at the same related object.
    pub fn to_attribute(&self) -> FoundryResult<AttributeValue> {
        Ok(AttributeValue::Plain(serde_json::to_value(&self.object)?))
    }

    /// Store id, once persisted.
    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.auto_refresh
    }

    pub fn enable_auto_refresh(&mut self) -> &mut Self {
        self.auto_refresh = true;
        self
    }

    pub fn disable_auto_refresh(&mut self) -> &mut Self {
        self.auto_refresh = false;
        self
    }

    /// Writes the object to the store. Calling it again updates the same
    /// record.
    pub fn persist(&mut self) -> FoundryResult<&mut Self> {
        let record = serde_json::to_value(&self.object)?;
        let id = self.persister.persist(T::NAME, self.id, &record)?;
        debug!(model = T::NAME, %id, "persisted");
        self.id = Some(id);
        Ok(self)
    }

    /// Writes in-memory changes of an already persisted object.
    pub fn save(&mut self) -> FoundryResult<&mut Self> {
        self.require_id()?;
        self.persist()
    }

    /// Replaces the in-memory object with the stored state.
    pub fn refresh(&mut self) -> FoundryResult<&mut Self> {
        let id = self.require_id()?;
        let record = self
            .persister
            .fetch(T::NAME, id)?
            .ok_or_else(|| FoundryError::RecordMissing {
                model: T::NAME.to_string(),
                id,
            })?;

        trace!(model = T::NAME, %id, "refreshed");
        self.object = serde_json::from_value(record)?;
        Ok(self)
    }

    /// Deletes the stored record and returns the detached object.
    pub fn remove(mut self) -> FoundryResult<T> {
        let id = self.require_id()?;
        if !self.persister.remove(T::NAME, id)? {
            return Err(FoundryError::RecordMissing {
                model: T::NAME.to_string(),
                id,
            });
        }
        self.id = None;
        Ok(self.object)
    }

    /// Runs `f` with auto-refresh suppressed, restoring the previous setting.
    pub fn without_auto_refresh<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.auto_refresh;
        self.auto_refresh = false;
        let result = f(self);
        self.auto_refresh = previous;
        result
    }

    /// Calls `f` with the object, refreshing it first when auto-refresh is on.
    pub fn execute_callback(
        &mut self,
        f: impl FnOnce(&mut T, &ResolvedAttributes),
        attributes: &ResolvedAttributes,
    ) -> FoundryResult<()> {
        if self.auto_refresh && self.is_persisted() {
            self.refresh()?;
        }
        f(&mut self.object, attributes);
        Ok(())
    }

    fn require_id(&self) -> FoundryResult<RecordId> {
        self.id.ok_or_else(|| FoundryError::NotPersisted {
            model: T::NAME.to_string(),
        })
    }
}

impl<T: Model + fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("model", &T::NAME)
            .field("object", &self.object)
            .field("id", &self.id)
            .field("auto_refresh", &self.auto_refresh)
            .finish()
    }
}

impl<T: Model> std::ops::Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.object
    }
}

impl<T: Model> BuiltObject for Handle<T> {
    fn target_type(&self) -> &'static str {
        T::NAME
    }

    fn object_value(&self) -> FoundryResult<Value> {
        Ok(serde_json::to_value(&self.object)?)
    }
}
