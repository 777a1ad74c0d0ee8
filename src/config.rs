//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use crate::error::ClientError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_SESSION_FILE: &str = ".signdesk-session.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

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
    /// API origin without a trailing slash, e.g. `https://sign.example.com`.
    pub api_url: String,
    /// Where the auth session is persisted between runs.
    pub session_file: PathBuf,
    pub timeouts: HttpTimeouts,
}

impl ClientConfig {
    /// Config pointing at `api_url` with default session path and timeouts.
    #[must_use]
    pub fn new(api_url: &str) -> Self {
        Self {
            api_url: normalize_base_url(api_url),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            timeouts: HttpTimeouts::default(),
        }
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `SIGNDESK_API_URL`: default `http://127.0.0.1:5000`
    /// - `SIGNDESK_SESSION_FILE`: default `.signdesk-session.json`
    /// - `SIGNDESK_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SIGNDESK_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns a validation error when `SIGNDESK_API_URL` is not an
    /// `http://` or `https://` URL.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_env_with_api_url(None)
    }

    /// Like [`ClientConfig::from_env`], but an explicit `api_url` replaces
    /// `SIGNDESK_API_URL`. Only the URL that ends up in use is validated.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the chosen URL is not an `http://` or
    /// `https://` URL.
    pub fn from_env_with_api_url(api_url: Option<&str>) -> Result<Self, ClientError> {
        let api_url = match api_url {
            Some(explicit) => explicit.to_owned(),
            None => std::env::var("SIGNDESK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };
        validate_base_url(&api_url)?;
        let session_file = std::env::var("SIGNDESK_SESSION_FILE")
            .map_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from);
        let timeouts = HttpTimeouts {
            request_secs: env_parse_u64("SIGNDESK_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("SIGNDESK_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_url: normalize_base_url(&api_url), session_file, timeouts })
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// # Errors
///
/// Validation error unless `raw` starts with `http://` or `https://`.
pub fn validate_base_url(raw: &str) -> Result<(), ClientError> {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Ok(());
    }
    Err(ClientError::Validation(format!("invalid API URL: {raw}")))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
