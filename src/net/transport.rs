//! HTTP transport for pipeline requests.
//!
//! Native builds apply the configured request/connect timeouts; in the
//! browser `reqwest` runs on `fetch`, which has no client-side timeout.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::error::ApiError;
use super::pipeline::{ApiRequest, ApiResponse};
use crate::config::ClientConfig;

/// Moves an [`ApiRequest`] to the backend and reads the full response.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// # Errors
    ///
    /// Returns `ApiError::Network` when no response was received.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// `reqwest`-backed transport rooted at the configured API base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs));
        let http = builder
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("http client build failed: {e}")))?;
        Ok(Self { http, base_url: config.api_base_url.trim_end_matches('/').to_owned() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url_for(&request.path))
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(method = %request.method, path = %request.path, error = %e, "request failed to send");
            ApiError::Network(e.to_string())
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }
}
