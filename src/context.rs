//! Per-dispatch context: the invoking source plus a typed value store.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StateError;
use crate::key::{Key, KeyId};

/// A stored value with its type erased.
pub type ErasedValue = Arc<dyn Any + Send + Sync>;

/// Holds the command source and every value parsed for one dispatch.
///
/// The store is guarded by a reader-writer lock, so a context can be
/// shared with work spawned by a command action.
pub struct CommandContext<S> {
    source: S,
    store: RwLock<HashMap<KeyId, ErasedValue>>,
}

impl<S> CommandContext<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            store: RwLock::new(HashMap::new()),
        }
    }

    /// The entity that issued the command.
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Returns a clone of the value stored under `key`.
    pub fn get<T: Clone + 'static>(&self, key: &Key<T>) -> Option<T> {
        self.read()
            .get(key.id())
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    pub fn get_or<T: Clone + 'static>(&self, key: &Key<T>, fallback: T) -> T {
        self.get(key).unwrap_or(fallback)
    }

    /// Like [`get`](Self::get), but absence is an error.
    pub fn require<T: Clone + 'static>(&self, key: &Key<T>) -> Result<T, StateError> {
        self.get(key).ok_or_else(|| StateError::MissingValue {
            key: key.id().to_string(),
        })
    }

    pub fn contains<T>(&self, key: &Key<T>) -> bool {
        self.contains_id(key.id())
    }

    pub fn contains_id(&self, id: &KeyId) -> bool {
        self.read().contains_key(id)
    }

    /// Stores a value. Fails if the key is already present.
    pub fn store<T: Send + Sync + 'static>(&self, key: &Key<T>, value: T) -> Result<(), StateError> {
        self.store_erased(key.id().clone(), Arc::new(value))
    }

    /// Stores a type-erased value. Fails if the key is already present.
    pub fn store_erased(&self, id: KeyId, value: ErasedValue) -> Result<(), StateError> {
        let mut store = self.write();
        if store.contains_key(&id) {
            return Err(StateError::KeyOccupied {
                key: id.to_string(),
            });
        }
        store.insert(id, value);
        Ok(())
    }

    /// Stores a value, overwriting any previous one. Returns true if a
    /// value was replaced.
    pub fn replace<T: Send + Sync + 'static>(&self, key: &Key<T>, value: T) -> bool {
        self.write()
            .insert(key.id().clone(), Arc::new(value))
            .is_some()
    }

    /// Removes a value. Returns true if one was present.
    pub fn remove<T>(&self, key: &Key<T>) -> bool {
        self.write().remove(key.id()).is_some()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<KeyId, ErasedValue>> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<KeyId, ErasedValue>> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: fmt::Debug> fmt::Debug for CommandContext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.read().keys().map(ToString::to_string).collect();
        keys.sort();
        f.debug_struct("CommandContext")
            .field("source", &self.source)
            .field("keys", &keys)
            .finish()
    }
}
