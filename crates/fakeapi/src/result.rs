//! Result and error types for the fake homeserver API.

use thiserror::Error;

/// Result type for fake API operations
pub type FakeApiResult<T> = Result<T, FakeApiError>;

/// Errors that can occur while intercepting or answering requests
#[derive(Debug, Error)]
pub enum FakeApiError {
    /// Descriptor matched none of the routing rules
    #[error("Unroutable request: {descriptor}")]
    UnroutableRequest {
        /// Debug rendering of the rejected descriptor
        descriptor: String,
    },

    /// Real network call failed
    #[error("Network request to {url} failed: {message}")]
    Network {
        /// Target that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Fixture could not be built or violates its own invariants
    #[error("Fixture error: {message}")]
    FixtureError {
        /// Error message
        message: String,
    },

    /// Server answered with a non-success status
    #[error("Request to {url} returned status {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Response claims to come from a different URL than requested
    #[error("Response URL mismatch: requested {expected}, got {actual}")]
    ResponseUrlMismatch {
        /// URL the caller requested
        expected: String,
        /// URL reported by the response
        actual: String,
    },

    /// Operation requires a logged in session
    #[error("Not logged in")]
    NotLoggedIn,

    /// Invalid responder configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Journal assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FakeApiError {
    /// Create a network error
    #[must_use]
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a fixture error
    #[must_use]
    pub fn fixture(message: impl Into<String>) -> Self {
        Self::FixtureError {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }
}
