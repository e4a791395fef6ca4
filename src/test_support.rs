//! Shared helpers for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::credentials::CredentialStore;
use crate::net::{ApiError, ApiRequest, ApiResponse, Transport};
use crate::storage::MemoryStorage;

/// Build an unsigned three-part token whose payload is `claims`.
pub fn token_with_claims(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Token for `sub` with an optional role claim.
pub fn token_for(sub: &str, role: Option<&str>) -> String {
    match role {
        Some(role) => token_with_claims(&serde_json::json!({ "sub": sub, "role": role })),
        None => token_with_claims(&serde_json::json!({ "sub": sub })),
    }
}

pub fn memory_store() -> (Arc<MemoryStorage>, CredentialStore) {
    let backend = Arc::new(MemoryStorage::new());
    let store = CredentialStore::with_default_keys(backend.clone());
    (backend, store)
}

/// Transport that records requests and replays queued responses.
///
/// With nothing queued it answers `200 {}`.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<ApiRequest>>,
    responses: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: u16, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(ApiResponse::new(status, body)));
    }

    pub fn fail(&self, error: ApiError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> ApiRequest {
        self.sent.lock().unwrap().last().cloned().expect("no request was sent")
    }
}

impl Transport for RecordingTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.sent.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::new(200, "{}")))
    }
}

/// Transport that signs `session` in as someone else while the request is in
/// flight, then answers with a fixed response.
pub struct ReloginTransport {
    pub session: crate::session::AuthSession,
    pub access_token: String,
    pub refresh_token: String,
    pub status: u16,
    pub body: String,
}

impl Transport for ReloginTransport {
    async fn send(&self, _request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.session.login(&self.access_token, &self.refresh_token).unwrap();
        Ok(ApiResponse::new(self.status, self.body.clone()))
    }
}
