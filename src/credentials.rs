//! Persisted access/refresh token pair.
//!
//! DESIGN
//! ======
//! The pair lives under two string keys (`accessToken`, `refreshToken` by
//! default). Both keys are written inside one synchronous call, and a read
//! only reports a pair when both entries are present, so a half-written or
//! half-cleared store reads as empty.
//!
//! ERROR HANDLING
//! ==============
//! Storage failures never reach callers. A failed write clears both keys and
//! the store degrades to "empty".

#[cfg(test)]
#[path = "credentials_test.rs"]
mod credentials_test;

use std::fmt;
use std::sync::Arc;

use crate::config::StorageKeys;
use crate::storage::KeyValueStorage;

/// The current access/refresh token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }
}

// Tokens are bearer secrets; keep them out of debug output and logs.
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Credential store over a shared storage backend. Cloning shares the backend.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStorage>,
    keys: StorageKeys,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore").field("keys", &self.keys).finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStorage>, keys: StorageKeys) -> Self {
        Self { backend, keys }
    }

    /// Store over `backend` using the default `accessToken`/`refreshToken` keys.
    pub fn with_default_keys(backend: Arc<dyn KeyValueStorage>) -> Self {
        Self::new(backend, StorageKeys::default())
    }

    /// Persist both tokens. On a backend failure the store is left empty.
    pub fn save(&self, access_token: &str, refresh_token: &str) {
        let result = self
            .backend
            .set(&self.keys.access_token, access_token)
            .and_then(|()| self.backend.set(&self.keys.refresh_token, refresh_token));
        if let Err(e) = result {
            tracing::warn!(error = %e, "credential write failed; clearing store");
            self.clear();
        }
    }

    /// Current pair, or `None` when either entry is missing or empty.
    pub fn read(&self) -> Option<CredentialPair> {
        let access_token = self.backend.get(&self.keys.access_token).filter(|v| !v.is_empty())?;
        let refresh_token = self.backend.get(&self.keys.refresh_token).filter(|v| !v.is_empty())?;
        Some(CredentialPair { access_token, refresh_token })
    }

    /// Stored access token alone, for the request pipeline.
    pub fn access_token(&self) -> Option<String> {
        self.read().map(|pair| pair.access_token)
    }

    /// `true` when any credential entry exists, including a partial pair.
    pub fn has_entries(&self) -> bool {
        self.backend.get(&self.keys.access_token).is_some()
            || self.backend.get(&self.keys.refresh_token).is_some()
    }

    pub fn clear(&self) {
        self.backend.remove(&self.keys.access_token);
        self.backend.remove(&self.keys.refresh_token);
    }
}
