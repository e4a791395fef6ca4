//! Bearer token claim decoding.
//!
//! SYSTEM CONTEXT
//! ==============
//! The access token is a three-part signed-claims token issued by the
//! backend. The client only reads the payload to learn who is signed in and
//! with which role; it never verifies the signature or expiry. The backend
//! stays the authority and signals rejection with `401`.

#[cfg(test)]
#[path = "token_test.rs"]
mod token_test;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};

/// Role assumed when the token carries no `role` claim.
pub const DEFAULT_ROLE: &str = "USER";

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a token could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedTokenError {
    #[error("malformed token: expected 3 dot-separated segments, found {0}")]
    Segments(usize),
    #[error("malformed token: empty segment")]
    EmptySegment,
    #[error("malformed token: payload is not base64url: {0}")]
    Base64(String),
    #[error("malformed token: payload is not a claims object: {0}")]
    Claims(String),
    #[error("malformed token: missing subject claim")]
    MissingSubject,
}

/// Claims read from the token payload. Unknown claims are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub iss: Option<String>,
    /// Expiry in seconds since the Unix epoch. Informational only.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    /// `exp` as a point in time, for display. `None` when absent or negative.
    pub fn expires_at(&self) -> Option<SystemTime> {
        let secs = u64::try_from(self.exp?).ok()?;
        UNIX_EPOCH.checked_add(Duration::from_secs(secs))
    }
}

/// Who the current access token says the user is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user identifier (`sub` claim).
    pub subject: String,
    /// Role claim, `"USER"` when absent.
    pub role: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == "ADMIN"
    }
}

/// Decode the identity carried by `token`.
///
/// # Errors
///
/// Returns `MalformedTokenError` when the token is not three non-empty
/// dot-separated segments, the payload is not base64url JSON claims, or the
/// `sub` claim is missing or empty.
pub fn decode(token: &str) -> Result<Identity, MalformedTokenError> {
    let claims = decode_claims(token)?;
    let subject = claims
        .sub
        .filter(|s| !s.is_empty())
        .ok_or(MalformedTokenError::MissingSubject)?;
    let role = claims
        .role
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_ROLE.to_owned());
    Ok(Identity { subject, role })
}

/// Decode the raw claims without requiring a subject.
///
/// # Errors
///
/// Returns `MalformedTokenError` when the token structure or payload is invalid.
pub fn decode_claims(token: &str) -> Result<Claims, MalformedTokenError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(MalformedTokenError::Segments(segments.len()));
    }
    if segments.iter().any(|s| s.is_empty()) {
        return Err(MalformedTokenError::EmptySegment);
    }
    let payload = URL_SAFE_LENIENT
        .decode(segments[1])
        .map_err(|e| MalformedTokenError::Base64(e.to_string()))?;
    serde_json::from_slice::<Claims>(&payload).map_err(|e| MalformedTokenError::Claims(e.to_string()))
}
