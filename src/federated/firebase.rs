//! Firebase popup binding for the browser build.
//!
//! The JS glue (`js/federated_sign_in.js`) wraps `signInWithPopup` with the
//! Google provider on the host page's default Firebase app and settles with
//! plain objects:
//! - success: `{ accessToken, idToken, user: { uid, displayName, email, photoURL, providerId } }`
//! - failure: `{ code, message, email }`

use serde::Deserialize;
use wasm_bindgen::prelude::*;

use super::{FederatedCredential, FederatedSignInError, IdentityProvider, SignInErrorCode};

#[wasm_bindgen(module = "/js/federated_sign_in.js")]
extern "C" {
    #[wasm_bindgen(catch, js_name = signInWithProviderPopup)]
    async fn sign_in_with_provider_popup() -> Result<JsValue, JsValue>;
}

#[derive(Debug, Default, Deserialize)]
struct JsFailure {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

fn to_json(value: &JsValue) -> Option<String> {
    js_sys::JSON::stringify(value).ok()?.as_string()
}

fn parse_failure(value: &JsValue) -> FederatedSignInError {
    let failure = to_json(value)
        .and_then(|raw| serde_json::from_str::<JsFailure>(&raw).ok())
        .unwrap_or_default();
    let code = SignInErrorCode::from_code(failure.code.as_deref().unwrap_or("auth/internal-error"));
    let error = FederatedSignInError::new(code, failure.message.unwrap_or_else(|| "sign-in failed".to_owned()));
    match failure.email {
        Some(email) => error.with_email(email),
        None => error,
    }
}

/// Popup sign-in through the host page's Firebase app.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirebasePopup;

impl IdentityProvider for FirebasePopup {
    async fn open_popup(&self) -> Result<FederatedCredential, FederatedSignInError> {
        let value = sign_in_with_provider_popup().await.map_err(|e| parse_failure(&e))?;
        let raw = to_json(&value).ok_or_else(|| {
            FederatedSignInError::new(SignInErrorCode::Other("auth/invalid-result".to_owned()), "empty sign-in result")
        })?;
        serde_json::from_str::<FederatedCredential>(&raw).map_err(|e| {
            FederatedSignInError::new(SignInErrorCode::Other("auth/invalid-result".to_owned()), e.to_string())
        })
    }
}
