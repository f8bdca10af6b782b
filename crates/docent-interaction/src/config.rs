//! Backend endpoint configuration.

use std::env;
use std::time::Duration;

/// Backend used when `DOCENT_BACKEND_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
/// Request timeout when `DOCENT_HTTP_TIMEOUT_SECS` is unset. Uploads
/// trigger server-side summarization before the response arrives.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Where and how to reach the backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL without a trailing slash, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, timeout }
    }

    /// Reads `DOCENT_BACKEND_URL` and `DOCENT_HTTP_TIMEOUT_SECS`, falling
    /// back to the local development defaults. An unparsable timeout is
    /// ignored rather than refused.
    pub fn from_env() -> Self {
        let base_url =
            env::var("DOCENT_BACKEND_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = env::var("DOCENT_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self::new(base_url, Duration::from_secs(timeout_secs))
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}
