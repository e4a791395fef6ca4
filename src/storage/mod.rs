//! Durable key-value backends for persisted client state.
//!
//! SYSTEM CONTEXT
//! ==============
//! The credential store is written against `KeyValueStorage` so the same
//! session logic runs on top of browser `localStorage` (hydrate) and an
//! in-memory map (tests, server rendering).


#[cfg(feature = "hydrate")]
pub mod local;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[cfg(feature = "hydrate")]
pub use local::LocalStorage;

/// Errors reported by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend is not reachable (no window, storage disabled, private mode).
    #[error("storage unavailable")]
    Unavailable,
    /// The backend refused the write (quota exceeded, security error).
    #[error("storage write failed: {0}")]
    Write(String),
}

/// Origin-scoped string key-value storage.
///
/// Reads never fail: an unreachable backend reads as empty.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend is unavailable or rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str);
}

/// In-process storage backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }
}
