//! API client: runs the request pipeline around a transport.
//!
//! ERROR HANDLING
//! ==============
//! Every failure reaches the caller as an `ApiError`: request steps can
//! reject a request, the transport reports network failures, and response
//! steps turn `401` and other non-2xx statuses into typed errors. Nothing is
//! retried.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::pipeline::{ApiRequest, ApiResponse, BearerAuth, RequestStep, ResponseStep, StatusCheck, UnauthorizedGuard};
use super::transport::{ReqwestTransport, Transport};
use crate::config::{ClientConfig, UnauthorizedPolicy};
use crate::session::AuthSession;

pub struct ApiClient<T> {
    transport: T,
    request_steps: Vec<Box<dyn RequestStep>>,
    response_steps: Vec<Box<dyn ResponseStep>>,
}

impl ApiClient<ReqwestTransport> {
    /// HTTP client for `config.api_base_url` wired to `session`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig, session: &AuthSession) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::for_session(transport, session, config.unauthorized_policy))
    }
}

impl<T: Transport> ApiClient<T> {
    /// Client with an empty pipeline.
    pub fn new(transport: T) -> Self {
        Self { transport, request_steps: Vec::new(), response_steps: Vec::new() }
    }

    /// Client with the standard pipeline: bearer attachment, unauthorized
    /// detection under `policy`, then status mapping.
    pub fn for_session(transport: T, session: &AuthSession, policy: UnauthorizedPolicy) -> Self {
        Self::new(transport)
            .with_request_step(BearerAuth::new(session.store().clone()))
            .with_response_step(UnauthorizedGuard::new(policy, session.clone()))
            .with_response_step(StatusCheck)
    }

    #[must_use]
    pub fn with_request_step(mut self, step: impl RequestStep + 'static) -> Self {
        self.request_steps.push(Box::new(step));
        self
    }

    #[must_use]
    pub fn with_response_step(mut self, step: impl ResponseStep + 'static) -> Self {
        self.response_steps.push(Box::new(step));
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run `request` through the pipeline and the transport.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a request step, the transport, or a
    /// response step.
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        for step in &self.request_steps {
            step.apply(&mut request)?;
        }
        tracing::debug!(method = %request.method, path = %request.path, "api request");
        let response = self.transport.send(&request).await?;
        for step in &self.response_steps {
            step.inspect(&request, &response)?;
        }
        Ok(response)
    }

    /// Run `request` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns any `execute` error, or `ApiError::Decode` for a body that
    /// does not match `R`.
    pub async fn execute_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ApiError> {
        self.execute(request).await?.json()
    }
}
