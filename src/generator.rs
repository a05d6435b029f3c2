use crate::errors::{KeyGenError, StoreError};
use crate::models::{key_at_index, Key, KeyStatus, ALPHABET, COMBINATION_SPACE, KEY_LEN};
use crate::store::KeyStore;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, error, info};

/// Random candidates tried before falling back to a linear probe.
const MAX_RANDOM_ATTEMPTS: usize = 64;

/// Issues unique keys and drives their issued -> submitted lifecycle.
///
/// The generator is the only writer of its store. It is shared between request
/// handlers behind an `Arc`; every method takes `&self`.
pub struct KeyGenerator {
    store: Box<dyn KeyStore>,
    // Reserved capacity: successful issuances plus generate calls in flight.
    issued: AtomicU64,
    // Held across get -> transition -> update so a key is submitted at most once.
    submit_lock: Mutex<()>,
}

impl KeyGenerator {
    /// Wraps a store. Records already in it count as issued.
    pub fn new(store: Box<dyn KeyStore>) -> Result<Self, StoreError> {
        let issued = store.len()? as u64;
        Ok(Self {
            store,
            issued: AtomicU64::new(issued),
            submit_lock: Mutex::new(()),
        })
    }

    /// Issues a key that has never been returned before.
    ///
    /// Fails with `CapacityExhausted` once every combination has been issued.
    /// A call aborted by a store failure keeps its reserved slot, so the free
    /// count never goes back up.
    pub fn generate(&self) -> Result<String, KeyGenError> {
        self.reserve()?;

        let value = self.allocate()?;
        info!(key = %value, "key generated");
        Ok(value)
    }

    /// Marks an issued key as submitted.
    pub fn submit(&self, value: &str) -> Result<(), KeyGenError> {
        if value.len() != KEY_LEN {
            return Err(KeyGenError::InvalidKeyLength);
        }

        let _guard = self.submit_lock.lock().map_err(|_| StoreError::Poisoned)?;

        let mut key = match self.store.get(value) {
            Ok(key) => key,
            Err(StoreError::NotFound) => return Err(KeyGenError::NotIssued),
            Err(e) => return Err(fault(e)),
        };

        key.submit()?;
        self.store.update(&key).map_err(fault)?;

        info!(key = %value, "key submitted");
        Ok(())
    }

    /// Reports where a key is in its lifecycle. Unknown keys are `NotIssued`.
    pub fn status(&self, value: &str) -> Result<KeyStatus, KeyGenError> {
        if value.len() != KEY_LEN {
            return Err(KeyGenError::InvalidKeyLength);
        }

        match self.store.get(value) {
            Ok(key) => Ok(key.status()),
            Err(StoreError::NotFound) => Ok(KeyStatus::NotIssued),
            Err(e) => Err(fault(e)),
        }
    }

    /// Number of keys that can still be issued.
    pub fn free_count(&self) -> u64 {
        COMBINATION_SPACE - self.issued_count()
    }

    pub fn issued_count(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn save(&self) -> Result<(), KeyGenError> {
        self.store.save().map_err(fault)
    }

    #[cfg(test)]
    pub(crate) fn set_issued_count(&self, issued: u64) {
        self.issued.store(issued, Ordering::SeqCst);
    }

    // Claims one unit of capacity; the counter never passes COMBINATION_SPACE.
    fn reserve(&self) -> Result<(), KeyGenError> {
        self.issued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < COMBINATION_SPACE).then_some(n + 1)
            })
            .map(|_| ())
            .map_err(|_| KeyGenError::CapacityExhausted)
    }

    fn allocate(&self) -> Result<String, KeyGenError> {
        let mut rng = rand::thread_rng();

        for attempt in 1..=MAX_RANDOM_ATTEMPTS {
            let candidate: String = (0..KEY_LEN)
                .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
                .collect();

            if let Some(value) = self.try_add(candidate)? {
                return Ok(value);
            }
            debug!(attempt, "key collision");
        }

        let start = rng.gen_range(0..COMBINATION_SPACE);
        debug!(start, "random attempts exhausted, probing");
        self.probe_from(start)
    }

    // With a slot reserved a free key exists, and keys are never removed, so
    // one sweep of the space always finds it.
    fn probe_from(&self, start: u64) -> Result<String, KeyGenError> {
        for offset in 0..COMBINATION_SPACE {
            if let Some(value) = self.try_add(key_at_index(start + offset))? {
                return Ok(value);
            }
        }
        Err(KeyGenError::CapacityExhausted)
    }

    /// `Ok(None)` when the candidate is already taken.
    fn try_add(&self, candidate: String) -> Result<Option<String>, KeyGenError> {
        let key = Key::new(candidate)?;
        let value = key.value().to_string();

        match self.store.add(key) {
            Ok(()) => Ok(Some(value)),
            Err(StoreError::AlreadyExists) => Ok(None),
            Err(e) => Err(fault(e)),
        }
    }
}

fn fault(e: StoreError) -> KeyGenError {
    error!(error = %e, "key store failure");
    KeyGenError::Internal(e)
}
