//! Request/response values and the steps that run around every call.
//!
//! DESIGN
//! ======
//! Requests and responses are plain values so each step can be exercised
//! without a network. `RequestStep`s run in order before the transport sees
//! the request; `ResponseStep`s run in order after the response arrives and
//! the first error wins.

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::types::ProblemDetail;
use crate::config::UnauthorizedPolicy;
use crate::credentials::CredentialStore;
use crate::session::AuthSession;

/// Longest raw body excerpt kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// An outbound backend request, relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, starting with `/` (e.g. `/books/1`).
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), headers: HeaderMap::new(), body: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Token carried in the `Authorization: Bearer` header, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }
}

/// A backend response with its body read to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Human-readable failure message: the problem-detail `detail`/`title`
    /// when present, otherwise a bounded excerpt of the raw body.
    pub fn error_message(&self) -> String {
        if let Ok(problem) = serde_json::from_str::<ProblemDetail>(&self.body) {
            if let Some(message) = problem.detail.or(problem.title) {
                return message;
            }
        }
        let trimmed = self.body.trim();
        if trimmed.is_empty() {
            return format!("status {}", self.status);
        }
        trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
    }
}

/// Transforms a request before it is transmitted.
pub trait RequestStep: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` when the request cannot be completed.
    fn apply(&self, request: &mut ApiRequest) -> Result<(), ApiError>;
}

/// Inspects a response after it is received.
pub trait ResponseStep: Send + Sync {
    /// # Errors
    ///
    /// Returns the `ApiError` the response should surface as.
    fn inspect(&self, request: &ApiRequest, response: &ApiResponse) -> Result<(), ApiError>;
}

/// Attaches the stored access token as a bearer credential.
///
/// The store is read at send time, so a login or logout between two calls is
/// reflected on the next request. Without a stored token any caller-supplied
/// `Authorization` header is dropped.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    store: CredentialStore,
}

impl BearerAuth {
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }
}

impl RequestStep for BearerAuth {
    fn apply(&self, request: &mut ApiRequest) -> Result<(), ApiError> {
        request.headers.remove(AUTHORIZATION);
        let Some(token) = self.store.access_token() else {
            return Ok(());
        };
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ApiError::InvalidRequest(format!("access token is not a valid header value: {e}")))?;
        value.set_sensitive(true);
        request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// Detects `401` responses and applies the configured policy.
#[derive(Debug, Clone)]
pub struct UnauthorizedGuard {
    policy: UnauthorizedPolicy,
    session: AuthSession,
}

impl UnauthorizedGuard {
    pub fn new(policy: UnauthorizedPolicy, session: AuthSession) -> Self {
        Self { policy, session }
    }
}

impl ResponseStep for UnauthorizedGuard {
    fn inspect(&self, request: &ApiRequest, response: &ApiResponse) -> Result<(), ApiError> {
        if response.status != 401 {
            return Ok(());
        }
        tracing::warn!(method = %request.method, path = %request.path, "backend rejected credential");
        if self.policy == UnauthorizedPolicy::Logout {
            // Only the credential that was actually rejected may end the session.
            let current = self.session.store().access_token();
            if request.bearer_token().is_some() && request.bearer_token() == current.as_deref() {
                self.session.logout();
            } else {
                tracing::debug!(path = %request.path, "401 for a superseded credential; session kept");
            }
        }
        Err(ApiError::Unauthorized { path: request.path.clone(), message: response.error_message() })
    }
}

/// Maps any non-2xx response to `ApiError::Http`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusCheck;

impl ResponseStep for StatusCheck {
    fn inspect(&self, request: &ApiRequest, response: &ApiResponse) -> Result<(), ApiError> {
        if response.is_success() {
            return Ok(());
        }
        tracing::debug!(method = %request.method, path = %request.path, status = response.status, "request failed");
        Err(ApiError::Http { status: response.status, message: response.error_message() })
    }
}
