//! # bookstore-client
//!
//! Client-side session and authentication core for the bookstore storefront.
//!
//! This crate owns the user's authenticated identity across page loads and
//! API calls: it persists the access/refresh token pair, decodes the access
//! token's claims, tracks the session state machine, wraps federated
//! (popup-based) sign-in, and runs every backend request through an explicit
//! request/response pipeline that attaches the bearer credential.
//!
//! The browser build (`hydrate` feature) binds storage to `localStorage` and
//! federated sign-in to the Firebase popup glue; the default build is native
//! and runs against in-memory storage.

pub mod auth;
pub mod config;
pub mod context;
pub mod credentials;
pub mod federated;
pub mod logging;
pub mod net;
pub mod session;
pub mod storage;
pub mod token;

pub use auth::{AuthFlowError, Authenticator};
pub use config::{ClientConfig, UnauthorizedPolicy};
pub use credentials::{CredentialPair, CredentialStore};
pub use session::{AuthSession, LoginError, SessionState};
pub use token::{Identity, MalformedTokenError};

#[cfg(test)]
pub(crate) mod test_support;

/// Install browser logging and restore the session from `localStorage`.
#[cfg(feature = "hydrate")]
pub fn start_browser_session(config: &ClientConfig) -> AuthSession {
    logging::init();
    let store = CredentialStore::new(std::sync::Arc::new(storage::LocalStorage), config.storage_keys.clone());
    AuthSession::bootstrap(store)
}
