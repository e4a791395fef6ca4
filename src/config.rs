//! Client configuration with defaults and environment overrides.
//!
//! SYSTEM CONTEXT
//! ==============
//! The browser build uses `ClientConfig::default()` (or a value baked in by
//! the embedding app); native builds and tests read overrides from the
//! environment through `ClientConfig::from_env`.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_ACCESS_TOKEN_KEY: &str = "accessToken";
pub const DEFAULT_REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors produced while building a [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),
}

/// What the API client does when the backend answers `401 Unauthorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnauthorizedPolicy {
    /// Surface `ApiError::Unauthorized` to the caller and leave the session alone.
    #[default]
    Detect,
    /// Surface the error and also run the session logout transition.
    Logout,
}

/// Storage keys for the persisted credential pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub access_token: String,
    pub refresh_token: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access_token: DEFAULT_ACCESS_TOKEN_KEY.to_owned(),
            refresh_token: DEFAULT_REFRESH_TOKEN_KEY.to_owned(),
        }
    }
}

/// HTTP timeouts applied by the native transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL including the `/api` prefix, without a trailing slash.
    pub api_base_url: String,
    pub storage_keys: StorageKeys,
    pub timeouts: HttpTimeouts,
    pub unauthorized_policy: UnauthorizedPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            storage_keys: StorageKeys::default(),
            timeouts: HttpTimeouts::default(),
            unauthorized_policy: UnauthorizedPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// Optional:
    /// - `BOOKSTORE_API_URL`: default `http://localhost:8080/api`
    /// - `BOOKSTORE_ACCESS_TOKEN_KEY`: default `accessToken`
    /// - `BOOKSTORE_REFRESH_TOKEN_KEY`: default `refreshToken`
    /// - `BOOKSTORE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `BOOKSTORE_CONNECT_TIMEOUT_SECS`: default 10
    /// - `BOOKSTORE_UNAUTHORIZED_POLICY`: `detect` (default) or `logout`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for an unknown unauthorized policy.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = normalize_base_url(
            &std::env::var("BOOKSTORE_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned()),
        );
        let storage_keys = StorageKeys {
            access_token: std::env::var("BOOKSTORE_ACCESS_TOKEN_KEY")
                .unwrap_or_else(|_| DEFAULT_ACCESS_TOKEN_KEY.to_owned()),
            refresh_token: std::env::var("BOOKSTORE_REFRESH_TOKEN_KEY")
                .unwrap_or_else(|_| DEFAULT_REFRESH_TOKEN_KEY.to_owned()),
        };
        let timeouts = HttpTimeouts {
            request_secs: env_parse_u64("BOOKSTORE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("BOOKSTORE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let unauthorized_policy =
            parse_unauthorized_policy(std::env::var("BOOKSTORE_UNAUTHORIZED_POLICY").ok().as_deref())?;

        Ok(Self { api_base_url, storage_keys, timeouts, unauthorized_policy })
    }

    /// Same config pointed at a different backend base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: &str) -> Self {
        self.api_base_url = normalize_base_url(url);
        self
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_unauthorized_policy(raw: Option<&str>) -> Result<UnauthorizedPolicy, ConfigError> {
    match raw.map(str::trim).unwrap_or("detect") {
        "detect" => Ok(UnauthorizedPolicy::Detect),
        "logout" => Ok(UnauthorizedPolicy::Logout),
        other => Err(ConfigError::Parse(format!(
            "unknown BOOKSTORE_UNAUTHORIZED_POLICY '{other}' (expected 'detect' or 'logout')"
        ))),
    }
}
