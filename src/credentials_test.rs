use super::*;
use crate::storage::{MemoryStorage, StorageError};
use crate::test_support::memory_store;

/// Accepts the first `budget` writes, then rejects every write.
struct QuotaStorage {
    inner: MemoryStorage,
    budget: std::sync::atomic::AtomicUsize,
}

impl QuotaStorage {
    fn new(budget: usize) -> Self {
        Self { inner: MemoryStorage::new(), budget: std::sync::atomic::AtomicUsize::new(budget) }
    }
}

impl KeyValueStorage for QuotaStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        use std::sync::atomic::Ordering;
        if self.budget.load(Ordering::SeqCst) == 0 {
            return Err(StorageError::Write("quota exceeded".to_owned()));
        }
        self.budget.fetch_sub(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) {
        self.inner.remove(key);
    }
}

#[test]
fn empty_store_reads_none() {
    let (_, store) = memory_store();
    assert_eq!(store.read(), None);
    assert_eq!(store.access_token(), None);
}

#[test]
fn save_then_read_returns_exact_pair() {
    let (backend, store) = memory_store();
    store.save("a.b.c", "refresh123");
    assert_eq!(store.read(), Some(CredentialPair::new("a.b.c", "refresh123")));
    assert_eq!(backend.get("accessToken").as_deref(), Some("a.b.c"));
    assert_eq!(backend.get("refreshToken").as_deref(), Some("refresh123"));
}

#[test]
fn clear_removes_both_entries() {
    let (backend, store) = memory_store();
    store.save("a.b.c", "r");
    store.clear();
    assert_eq!(store.read(), None);
    assert!(backend.is_empty());
}

#[test]
fn partial_pair_reads_as_empty() {
    let (backend, store) = memory_store();
    backend.set("accessToken", "a.b.c").unwrap();
    assert_eq!(store.read(), None);
    assert!(store.has_entries());
}

#[test]
fn empty_value_reads_as_missing() {
    let (backend, store) = memory_store();
    backend.set("accessToken", "").unwrap();
    backend.set("refreshToken", "r").unwrap();
    assert_eq!(store.read(), None);
}

#[test]
fn custom_keys_are_respected() {
    let backend = Arc::new(MemoryStorage::new());
    let keys = StorageKeys { access_token: "at".to_owned(), refresh_token: "rt".to_owned() };
    let store = CredentialStore::new(backend.clone(), keys);
    store.save("x.y.z", "r");
    assert_eq!(backend.get("at").as_deref(), Some("x.y.z"));
    assert_eq!(backend.get("accessToken"), None);
}

#[test]
fn failed_second_write_leaves_store_empty() {
    let backend = Arc::new(QuotaStorage::new(1));
    let store = CredentialStore::with_default_keys(backend.clone());
    store.save("a.b.c", "r");
    assert_eq!(store.read(), None);
    assert!(!store.has_entries());
}

#[test]
fn debug_output_redacts_tokens() {
    let pair = CredentialPair::new("secret.access.token", "secret-refresh");
    let rendered = format!("{pair:?}");
    assert!(!rendered.contains("secret"));
    assert!(rendered.contains("redacted"));
}
