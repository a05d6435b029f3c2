use std::collections::HashMap;
use std::sync::RwLock;

use crate::errors::StoreError;
use crate::models::Key;

/// Repository of issued keys, indexed by key value.
///
/// Records are handed out by value, so a caller that changes a `Key` must call
/// `update` for the change to be seen by later `get` calls. Keys are never removed.
pub trait KeyStore: Send + Sync {
    fn get(&self, value: &str) -> Result<Key, StoreError>;

    /// Inserts a new record. The existence check and the insert are one atomic step.
    fn add(&self, key: Key) -> Result<(), StoreError>;

    /// Writes the record's current state over the stored one.
    fn update(&self, key: &Key) -> Result<(), StoreError>;

    /// Flushes pending writes to the backing medium.
    fn save(&self) -> Result<(), StoreError>;

    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<String, Key>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, value: &str) -> Result<Key, StoreError> {
        let keys = self.keys.read().map_err(|_| StoreError::Poisoned)?;
        keys.get(value).cloned().ok_or(StoreError::NotFound)
    }

    fn add(&self, key: Key) -> Result<(), StoreError> {
        let mut keys = self.keys.write().map_err(|_| StoreError::Poisoned)?;
        if keys.contains_key(key.value()) {
            return Err(StoreError::AlreadyExists);
        }

        keys.insert(key.value().to_string(), key);
        Ok(())
    }

    fn update(&self, key: &Key) -> Result<(), StoreError> {
        let mut keys = self.keys.write().map_err(|_| StoreError::Poisoned)?;
        match keys.get_mut(key.value()) {
            Some(stored) => {
                *stored = key.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn save(&self) -> Result<(), StoreError> {
        // Nothing to flush, state lives in memory only.
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreError> {
        let keys = self.keys.read().map_err(|_| StoreError::Poisoned)?;
        Ok(keys.len())
    }
}
