//! Leptos-facing auth context.
//!
//! SYSTEM CONTEXT
//! ==============
//! The app root calls `provide_auth` once; route guards and user-aware
//! components read it back with `use_auth`. The context keeps a signal
//! mirror of the session state so views re-render on login and logout.
//!
//! In the browser a local task follows the session's watch channel, so a
//! logout that happens outside the UI (the unauthorized guard, for
//! instance) still reaches the mirror.

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;

use crate::session::{AuthSession, LoginError, SessionState};
use crate::token::Identity;

pub const LOGIN_PATH: &str = "/login";

#[derive(Clone, Debug)]
pub struct AuthContext {
    session: AuthSession,
    state: RwSignal<SessionState>,
}

impl AuthContext {
    pub fn new(session: AuthSession) -> Self {
        let state = RwSignal::new(session.state());
        #[cfg(feature = "hydrate")]
        follow_session(&session, state);
        Self { session, state }
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Reactive session state.
    pub fn state(&self) -> RwSignal<SessionState> {
        self.state
    }

    pub fn user(&self) -> Option<Identity> {
        self.state.with(|s| s.identity().cloned())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.with(SessionState::is_authenticated)
    }

    /// # Errors
    ///
    /// Propagates [`AuthSession::login`] failures; the mirror is refreshed
    /// either way.
    pub fn login(&self, access_token: &str, refresh_token: &str) -> Result<Identity, LoginError> {
        let result = self.session.login(access_token, refresh_token);
        self.sync();
        result
    }

    pub fn logout(&self) {
        self.session.logout();
        self.sync();
    }

    /// Copy the session's current state into the signal if it differs.
    pub fn sync(&self) {
        let current = self.session.state();
        if self.state.with_untracked(|s| *s != current) {
            self.state.set(current);
        }
    }
}

#[cfg(feature = "hydrate")]
fn follow_session(session: &AuthSession, state: RwSignal<SessionState>) {
    let mut updates = session.subscribe();
    leptos::task::spawn_local(async move {
        while updates.changed().await.is_ok() {
            let next = updates.borrow_and_update().clone();
            // Owner disposed.
            if state.try_set(next).is_some() {
                break;
            }
        }
    });
}

/// Install an [`AuthContext`] for `session` in the current reactive owner.
pub fn provide_auth(session: AuthSession) -> AuthContext {
    let auth = AuthContext::new(session);
    provide_context(auth.clone());
    auth
}

/// The context installed by [`provide_auth`].
///
/// # Panics
///
/// Panics when called outside a component tree that ran `provide_auth`.
pub fn use_auth() -> AuthContext {
    expect_context::<AuthContext>()
}

pub fn should_redirect_unauth(state: &SessionState) -> bool {
    !state.is_authenticated()
}

/// Redirect to `/login` whenever the mirrored session is anonymous.
pub fn install_unauth_redirect<F>(auth: &AuthContext, navigate: F)
where
    F: Fn(&str, NavigateOptions) + Clone + 'static,
{
    let state = auth.state();
    Effect::new(move || {
        if state.with(should_redirect_unauth) {
            navigate(LOGIN_PATH, NavigateOptions::default());
        }
    });
}
