//! The validated mutation/query engine over a persistence backend.

use std::sync::{Mutex, PoisonError};

use crate::backend::ProfileBackend;
use crate::error::StoreError;
use crate::value::{AttributeMap, AttributeValue};

/// Durable attribute mapping with whole-map replace semantics.
///
/// Every mutation is a load → decide → persist cycle over the whole
/// map, serialized by an internal mutex so concurrent updates cannot
/// interleave and lose writes. Validation happens before storage is
/// touched: a batch containing any unsupported value is rejected in
/// full, leaving the persisted map untouched.
pub struct AttributeStore<B> {
    backend: B,
    write_lock: Mutex<()>,
}

impl<B: ProfileBackend> AttributeStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the persisted map, or an empty map if none exists yet.
    pub fn load(&self) -> Result<AttributeMap, StoreError> {
        Ok(self.backend.load_attributes()?.unwrap_or_default())
    }

    /// Overwrites the persisted map with `map`, after stripping any key
    /// whose value is the empty string. Returns the map as stored.
    pub fn replace(&self, mut map: AttributeMap) -> Result<AttributeMap, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        map.retain(|_, value| !value.is_empty_text());
        self.backend.persist_attributes(&map)?;
        Ok(map)
    }

    /// Applies a batch of updates on top of the persisted map.
    ///
    /// The whole batch is validated first; any unsupported value fails
    /// the call with [`StoreError::UnsupportedValue`] and nothing is
    /// written. An empty-string value removes the attribute it names.
    /// Returns `Ok(None)` for an empty batch (nothing persisted, no
    /// change to notify), otherwise the resulting map.
    pub fn merge(
        &self,
        updates: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Option<AttributeMap>, StoreError> {
        if updates.is_empty() {
            return Ok(None);
        }
        let mut validated = Vec::with_capacity(updates.len());
        for (key, value) in updates {
            validated.push((key.clone(), AttributeValue::from_json(key, value)?));
        }

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.backend.load_attributes()?.unwrap_or_default();
        for (key, value) in validated {
            if value.is_empty_text() {
                map.remove(&key);
            } else {
                map.insert(key, value);
            }
        }
        self.backend.persist_attributes(&map)?;
        Ok(Some(map))
    }

    /// Removes the given keys from the persisted map.
    ///
    /// Returns `Ok(None)` without writing when none of the keys were
    /// present, so a no-op removal never produces a spurious change
    /// notification.
    pub fn delete(&self, keys: &[String]) -> Result<Option<AttributeMap>, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.backend.load_attributes()?.unwrap_or_default();
        let mut changed = false;
        for key in keys {
            changed |= map.remove(key).is_some();
        }
        if !changed {
            return Ok(None);
        }
        self.backend.persist_attributes(&map)?;
        Ok(Some(map))
    }

    /// Returns the intersection of the persisted map with `keys`. An
    /// empty request selects the entire map.
    pub fn select(&self, keys: &[String]) -> Result<AttributeMap, StoreError> {
        let map = self.load()?;
        if keys.is_empty() {
            return Ok(map);
        }
        let mut selected = AttributeMap::new();
        for key in keys {
            if let Some(value) = map.get(key) {
                selected.insert(key.clone(), value.clone());
            }
        }
        Ok(selected)
    }

    /// Erases the persisted map entirely.
    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.backend.erase_attributes()
    }
}
