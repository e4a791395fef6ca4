//! Session state machine for the signed-in user.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `AuthSession` is created at application start and handed to every
//! consumer (API client, auth flows, UI context). It has two states,
//! `Anonymous` and `Authenticated(identity)`, and three transitions:
//! bootstrap, login and logout.
//!
//! ORDERING
//! ========
//! Every transition writes the credential store and then publishes the new
//! state inside one synchronous call. There is no suspension point between
//! the two, so no task can observe `Authenticated` over an empty store.
//!
//! A failed login never leaves the store holding a token the session could
//! not decode: the store is cleared and the session ends `Anonymous`.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use tokio::sync::watch;

use crate::credentials::{CredentialPair, CredentialStore};
use crate::token::{self, Identity, MalformedTokenError};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(identity) => Some(identity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Errors returned by an explicit login.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    /// The access token could not be decoded.
    #[error(transparent)]
    MalformedToken(#[from] MalformedTokenError),
    /// The pair could not be persisted (empty refresh token or storage failure).
    #[error("credentials could not be persisted")]
    NotPersisted,
}

/// Shared handle to the application's session. Clones observe the same state.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<Inner>,
}

struct Inner {
    store: CredentialStore,
    state: watch::Sender<SessionState>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession").field("state", &*self.inner.state.borrow()).finish_non_exhaustive()
    }
}

impl AuthSession {
    /// Anonymous session over `store`, without reading it.
    pub fn new(store: CredentialStore) -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        Self { inner: Arc::new(Inner { store, state }) }
    }

    /// Session restored from whatever `store` holds.
    ///
    /// An undecodable stored token, or a half-present pair, is treated as a
    /// logout: the store is cleared and the session stays `Anonymous`.
    pub fn bootstrap(store: CredentialStore) -> Self {
        let session = Self::new(store);
        session.restore();
        session
    }

    fn restore(&self) {
        let Some(pair) = self.inner.store.read() else {
            if self.inner.store.has_entries() {
                tracing::warn!("partial credential pair in storage; clearing");
                self.logout();
            }
            return;
        };
        match token::decode(&pair.access_token) {
            Ok(identity) => {
                tracing::info!(subject = %identity.subject, role = %identity.role, "session restored");
                self.inner.state.send_replace(SessionState::Authenticated(identity));
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored access token undecodable; logging out");
                self.logout();
            }
        }
    }

    /// Persist `access_token`/`refresh_token` and move to `Authenticated`.
    ///
    /// An empty refresh token is refused: the store only ever holds a pair
    /// with both entries non-empty, so `login(access, "")` ends `Anonymous`
    /// with `LoginError::NotPersisted`.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::MalformedToken` if the access token cannot be
    /// decoded and `LoginError::NotPersisted` if the pair did not reach
    /// storage. Either way the store is cleared and the session is
    /// `Anonymous` afterwards.
    pub fn login(&self, access_token: &str, refresh_token: &str) -> Result<Identity, LoginError> {
        self.inner.store.save(access_token, refresh_token);

        let identity = match token::decode(access_token) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "login rejected: access token undecodable");
                self.logout();
                return Err(e.into());
            }
        };
        if self.inner.store.read().is_none() {
            tracing::warn!("login rejected: credentials not persisted");
            self.logout();
            return Err(LoginError::NotPersisted);
        }

        tracing::info!(subject = %identity.subject, role = %identity.role, "session authenticated");
        self.inner.state.send_replace(SessionState::Authenticated(identity.clone()));
        Ok(identity)
    }

    /// Clear stored credentials and move to `Anonymous`. Idempotent.
    pub fn logout(&self) {
        let had_entries = self.inner.store.has_entries();
        self.inner.store.clear();
        let changed = self.inner.state.send_if_modified(|state| {
            if state.is_authenticated() {
                *state = SessionState::Anonymous;
                true
            } else {
                false
            }
        });
        if changed || had_entries {
            tracing::info!("session ended");
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn user(&self) -> Option<Identity> {
        self.inner.state.borrow().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Stored credential pair, if any.
    pub fn credentials(&self) -> Option<CredentialPair> {
        self.inner.store.read()
    }

    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }
}
