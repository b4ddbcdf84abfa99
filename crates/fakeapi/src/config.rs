//! Responder configuration

use crate::result::{FakeApiError, FakeApiResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Homeserver the daydream login form is pointed at in tests
pub const DEFAULT_HOMESERVER_URL: &str = "http://localhost:8448";
/// Path of the password login endpoint
pub const LOGIN_PATH: &str = "/_matrix/client/r0/login";
/// Path of the sync endpoint
pub const SYNC_PATH: &str = "/_matrix/client/r0/sync";
/// Compiled application module, never mocked
pub const DEFAULT_ASSET_NAME: &str = "daydream.wasm";
/// Long enough for a test to see the loading spinner appear and go away
pub const DEFAULT_SYNC_DELAY_MS: u64 = 2000;
/// Upper bound accepted by [`ResponderConfig::validate`]
pub const MAX_SYNC_DELAY_MS: u64 = 60_000;

/// Mock responder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    /// Base URL of the simulated homeserver
    pub homeserver_url: String,
    /// Path of the login endpoint under the homeserver
    pub login_path: String,
    /// Bare asset name passed through to the real network
    pub asset_name: String,
    /// Artificial delay before sync responses resolve
    pub sync_delay_ms: u64,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            homeserver_url: DEFAULT_HOMESERVER_URL.to_string(),
            login_path: LOGIN_PATH.to_string(),
            asset_name: DEFAULT_ASSET_NAME.to_string(),
            sync_delay_ms: DEFAULT_SYNC_DELAY_MS,
        }
    }
}

impl ResponderConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the homeserver base URL
    #[must_use]
    pub fn with_homeserver_url(mut self, url: impl Into<String>) -> Self {
        self.homeserver_url = url.into();
        self
    }

    /// Set the login path
    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Set the pass-through asset name
    #[must_use]
    pub fn with_asset_name(mut self, name: impl Into<String>) -> Self {
        self.asset_name = name.into();
        self
    }

    /// Set the sync delay
    #[must_use]
    pub const fn with_sync_delay_ms(mut self, delay_ms: u64) -> Self {
        self.sync_delay_ms = delay_ms;
        self
    }

    /// Exact URL login requests must target
    #[must_use]
    pub fn login_endpoint(&self) -> String {
        join_url(&self.homeserver_url, &self.login_path)
    }

    /// URL of the sync endpoint
    #[must_use]
    pub fn sync_endpoint(&self) -> String {
        join_url(&self.homeserver_url, SYNC_PATH)
    }

    /// Sync delay as a duration
    #[must_use]
    pub const fn sync_delay(&self) -> Duration {
        Duration::from_millis(self.sync_delay_ms)
    }

    /// Reject configurations the responder cannot route with
    pub fn validate(&self) -> FakeApiResult<()> {
        if self.asset_name.trim().is_empty() {
            return Err(FakeApiError::config("asset_name must not be empty"));
        }
        if !(self.homeserver_url.starts_with("http://")
            || self.homeserver_url.starts_with("https://"))
        {
            return Err(FakeApiError::config(format!(
                "homeserver_url must be an http(s) URL, got {:?}",
                self.homeserver_url
            )));
        }
        if !self.login_path.starts_with('/') {
            return Err(FakeApiError::config(format!(
                "login_path must start with '/', got {:?}",
                self.login_path
            )));
        }
        if self.sync_delay_ms > MAX_SYNC_DELAY_MS {
            return Err(FakeApiError::config(format!(
                "sync_delay_ms {} exceeds {MAX_SYNC_DELAY_MS}",
                self.sync_delay_ms
            )));
        }
        Ok(())
    }
}

/// Join a base URL and an absolute path without doubling the slash
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_login_endpoint() {
        let config = ResponderConfig::default();
        assert_eq!(
            config.login_endpoint(),
            "http://localhost:8448/_matrix/client/r0/login"
        );
        assert_eq!(config.sync_delay(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_trailing_slash_is_not_doubled() {
        let config = ResponderConfig::new().with_homeserver_url("http://hs.test/");
        assert_eq!(config.login_endpoint(), "http://hs.test/_matrix/client/r0/login");
        assert_eq!(config.sync_endpoint(), "http://hs.test/_matrix/client/r0/sync");
    }

    #[test]
    fn test_validate_rejects_empty_asset() {
        let err = ResponderConfig::new().with_asset_name(" ").validate().unwrap_err();
        assert!(err.to_string().contains("asset_name"));
    }

    #[test]
    fn test_validate_rejects_non_http_homeserver() {
        let config = ResponderConfig::new().with_homeserver_url("localhost:8448");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_relative_login_path() {
        let config = ResponderConfig::new().with_login_path("login");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_huge_delay() {
        let config = ResponderConfig::new().with_sync_delay_ms(MAX_SYNC_DELAY_MS + 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ResponderConfig = serde_json::from_str(r#"{"sync_delay_ms": 0}"#).unwrap();
        assert_eq!(config.sync_delay_ms, 0);
        assert_eq!(config.asset_name, DEFAULT_ASSET_NAME);
    }
}
