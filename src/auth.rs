//! Sign-in, refresh and sign-out flows.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pages call these instead of touching the API client and the session
//! separately. Each flow talks to the backend first and only then moves the
//! session, so a failed round trip never changes who is signed in.
//!
//! ERROR HANDLING
//! ==============
//! Backend failures arrive as `AuthFlowError::Api`, token problems as
//! `AuthFlowError::Login`, and provider failures (including a dismissed
//! popup) as `AuthFlowError::Federated`.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::federated::{FederatedSignIn, FederatedSignInError, IdentityProvider};
use crate::net::types::AuthTokens;
use crate::net::{ApiClient, ApiError, Transport};
use crate::session::{AuthSession, LoginError};
use crate::token::Identity;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFlowError {
    #[error("backend request failed: {0}")]
    Api(#[from] ApiError),
    #[error("login failed: {0}")]
    Login(#[from] LoginError),
    #[error(transparent)]
    Federated(FederatedSignInError),
    #[error("no stored credentials to refresh")]
    NotSignedIn,
    /// The stored credentials changed while the call was in flight.
    #[error("session changed during the request")]
    Superseded,
}

/// Backend-aware auth flows over one session.
pub struct Authenticator<T> {
    api: ApiClient<T>,
    session: AuthSession,
}

impl<T: Transport> Authenticator<T> {
    pub fn new(api: ApiClient<T>, session: AuthSession) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    /// Email/password sign-in.
    ///
    /// # Errors
    ///
    /// Returns `AuthFlowError::Api` when the backend rejects the credentials
    /// and `AuthFlowError::Login` when the issued tokens cannot be stored.
    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<Identity, AuthFlowError> {
        let tokens = self.api.password_login(email, password).await?;
        self.establish(&tokens)
    }

    /// Popup sign-in followed by a backend token exchange.
    ///
    /// The session is untouched unless the exchange succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AuthFlowError::Federated` when the popup fails or is
    /// dismissed, otherwise as [`Self::login_with_password`].
    pub async fn login_with_provider<P: IdentityProvider>(
        &self,
        federated: &FederatedSignIn<P>,
    ) -> Result<Identity, AuthFlowError> {
        let credential = federated.sign_in().await.into_result().map_err(AuthFlowError::Federated)?;
        let tokens = self.api.exchange_social_token(credential.exchange_token()).await?;
        self.establish(&tokens)
    }

    /// Trade the stored refresh token for a new pair.
    ///
    /// A `401` means the refresh token is no longer accepted; the session is
    /// logged out before the error is returned. Other failures leave the
    /// session as it was. If the stored pair changed while the call was in
    /// flight (a login or logout elsewhere) the result is discarded.
    ///
    /// # Errors
    ///
    /// Returns `AuthFlowError::NotSignedIn` without stored credentials,
    /// `AuthFlowError::Superseded` when the session changed meanwhile,
    /// `AuthFlowError::Api` on backend failure, or `AuthFlowError::Login` if
    /// the new pair cannot be stored.
    pub async fn refresh(&self) -> Result<Identity, AuthFlowError> {
        let pair = self.session.credentials().ok_or(AuthFlowError::NotSignedIn)?;
        let outcome = self.api.refresh_tokens(&pair.refresh_token).await;
        if self.session.credentials().as_ref() != Some(&pair) {
            tracing::info!("session changed during refresh; result discarded");
            return Err(AuthFlowError::Superseded);
        }
        match outcome {
            Ok(tokens) => self.establish(&tokens),
            Err(e) => {
                if e.is_unauthorized() {
                    tracing::info!("refresh token rejected; logging out");
                    self.session.logout();
                }
                Err(e.into())
            }
        }
    }

    /// Notify the backend, then end the local session regardless of the
    /// backend's answer.
    pub async fn logout(&self) {
        if self.session.credentials().is_some() {
            if let Err(e) = self.api.server_logout().await {
                tracing::warn!(error = %e, "server logout failed; clearing local session anyway");
            }
        }
        self.session.logout();
    }

    fn establish(&self, tokens: &AuthTokens) -> Result<Identity, AuthFlowError> {
        let identity = self.session.login(&tokens.access_token, &tokens.refresh_token)?;
        tracing::info!(subject = %identity.subject, role = %identity.role, "signed in");
        Ok(identity)
    }
}
