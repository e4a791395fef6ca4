//! Networking modules for backend REST calls.
//!
//! SYSTEM CONTEXT
//! ==============
//! `pipeline` defines the request/response values and the composable steps
//! (bearer attachment, unauthorized detection, status mapping), `transport`
//! moves them over HTTP, `client` runs the pipeline, `api` holds the typed
//! endpoints, and `types` defines the backend's JSON schema.

pub mod api;
pub mod client;
pub mod error;
pub mod pipeline;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use pipeline::{ApiRequest, ApiResponse, BearerAuth, RequestStep, ResponseStep, StatusCheck, UnauthorizedGuard};
pub use transport::{ReqwestTransport, Transport};
