//! Federated (popup-based) sign-in adapter.
//!
//! SYSTEM CONTEXT
//! ==============
//! The external identity provider opens a popup and eventually reports a
//! credential or an error. This module turns that into one awaitable call
//! returning `ExternalCredentialResult`. It never touches the session:
//! callers exchange the credential with the backend and then log in.
//!
//! CONCURRENCY
//! ===========
//! `FederatedSignIn` is single-flight. A second `sign_in()` while a popup is
//! open resolves immediately with `SignInErrorCode::AlreadyPending`; the
//! pending flag is released when the first call settles or is dropped.


#[cfg(feature = "hydrate")]
pub mod firebase;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Normalized user profile reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUser {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
}

/// Successful provider sign-in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedCredential {
    /// Provider OAuth access token.
    pub access_token: String,
    /// Provider-issued ID token, the value the backend verifies.
    #[serde(default)]
    pub id_token: Option<String>,
    pub user: ProviderUser,
}

impl FederatedCredential {
    pub fn display_name(&self) -> Option<&str> {
        self.user.display_name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref()
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.user.photo_url.as_deref()
    }

    /// Token to hand to the backend exchange: the ID token when present.
    pub fn exchange_token(&self) -> &str {
        self.id_token.as_deref().unwrap_or(&self.access_token)
    }
}

impl fmt::Debug for FederatedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FederatedCredential")
            .field("access_token", &"<redacted>")
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .finish()
    }
}

/// Provider failure codes, parsed from `auth/...` strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInErrorCode {
    PopupClosedByUser,
    CancelledPopupRequest,
    PopupBlocked,
    NetworkRequestFailed,
    AccountExistsWithDifferentCredential,
    /// Another sign-in from this adapter is still in flight.
    AlreadyPending,
    Other(String),
}

impl SignInErrorCode {
    pub fn from_code(code: &str) -> Self {
        match code {
            "auth/popup-closed-by-user" => Self::PopupClosedByUser,
            "auth/cancelled-popup-request" => Self::CancelledPopupRequest,
            "auth/popup-blocked" => Self::PopupBlocked,
            "auth/network-request-failed" => Self::NetworkRequestFailed,
            "auth/account-exists-with-different-credential" => Self::AccountExistsWithDifferentCredential,
            "auth/already-pending" => Self::AlreadyPending,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PopupClosedByUser => "auth/popup-closed-by-user",
            Self::CancelledPopupRequest => "auth/cancelled-popup-request",
            Self::PopupBlocked => "auth/popup-blocked",
            Self::NetworkRequestFailed => "auth/network-request-failed",
            Self::AccountExistsWithDifferentCredential => "auth/account-exists-with-different-credential",
            Self::AlreadyPending => "auth/already-pending",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for SignInErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-reported sign-in failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("federated sign-in failed ({code}): {message}")]
pub struct FederatedSignInError {
    pub code: SignInErrorCode,
    pub message: String,
    /// Email tied to the failed attempt, when the provider reports one.
    pub email: Option<String>,
}

impl FederatedSignInError {
    pub fn new(code: SignInErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), email: None }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// The user dismissed the popup or another popup superseded it.
    pub fn is_cancellation(&self) -> bool {
        matches!(self.code, SignInErrorCode::PopupClosedByUser | SignInErrorCode::CancelledPopupRequest)
    }
}

/// Outcome of one federated sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalCredentialResult {
    Success(FederatedCredential),
    Failure(FederatedSignInError),
}

impl ExternalCredentialResult {
    pub fn into_result(self) -> Result<FederatedCredential, FederatedSignInError> {
        match self {
            Self::Success(credential) => Ok(credential),
            Self::Failure(error) => Err(error),
        }
    }
}

/// The external popup flow. Implementations must settle (with a failure when
/// the popup is dismissed) rather than hang.
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    async fn open_popup(&self) -> Result<FederatedCredential, FederatedSignInError>;
}

/// Single-flight wrapper around an [`IdentityProvider`].
pub struct FederatedSignIn<P> {
    provider: P,
    pending: AtomicBool,
}

struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<P: IdentityProvider> FederatedSignIn<P> {
    pub fn new(provider: P) -> Self {
        Self { provider, pending: AtomicBool::new(false) }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Run the popup flow once.
    pub async fn sign_in(&self) -> ExternalCredentialResult {
        if self.pending.swap(true, Ordering::AcqRel) {
            tracing::debug!("federated sign-in already in flight");
            return ExternalCredentialResult::Failure(FederatedSignInError::new(
                SignInErrorCode::AlreadyPending,
                "a sign-in popup is already open",
            ));
        }
        let _guard = PendingGuard(&self.pending);

        match self.provider.open_popup().await {
            Ok(credential) => {
                tracing::info!(
                    uid = %credential.user.uid,
                    provider = credential.user.provider_id.as_deref().unwrap_or("unknown"),
                    "federated sign-in succeeded"
                );
                ExternalCredentialResult::Success(credential)
            }
            Err(error) => {
                if error.is_cancellation() {
                    tracing::info!(code = %error.code, "federated sign-in cancelled");
                } else {
                    tracing::warn!(code = %error.code, message = %error.message, "federated sign-in failed");
                }
                ExternalCredentialResult::Failure(error)
            }
        }
    }
}
