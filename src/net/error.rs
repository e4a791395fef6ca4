//! Error type shared by the request pipeline, transport and endpoints.

/// Errors produced by backend API calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The backend rejected the request's credential (`401`).
    #[error("unauthorized request to {path}: {message}")]
    Unauthorized { path: String, message: String },

    /// The backend returned any other non-success status.
    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not match the expected schema.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Http { status, .. } => Some(*status),
            Self::Network(_) | Self::Decode(_) | Self::InvalidRequest(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
