//! Request Journal
//!
//! Records every call that flows through a [`Fetch`] so tests can assert on
//! what the application asked for. Wraps the responder (or any other network)
//! rather than living inside it.

use crate::network::{Fetch, FetchResponse, HttpMethod, RequestDescriptor};
use crate::result::{FakeApiError, FakeApiResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use uuid::Uuid;

/// Pattern for matching request targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Prefix match
    Prefix(String),
    /// Contains substring
    Contains(String),
    /// Regex match
    Regex(String),
    /// Glob pattern (e.g., "*/_matrix/client/*")
    Glob(String),
    /// Match any URL
    Any,
}

impl UrlPattern {
    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Prefix(pattern) => url.starts_with(pattern),
            Self::Contains(pattern) => url.contains(pattern),
            Self::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(url))
                .unwrap_or(false),
            Self::Glob(pattern) => glob_matches(pattern, url),
            Self::Any => true,
        }
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(s) | Self::Prefix(s) | Self::Contains(s) | Self::Regex(s) | Self::Glob(s) => {
                write!(f, "{s}")
            }
            Self::Any => write!(f, "*"),
        }
    }
}

// `*` matches any run of characters, including `/`; the whole URL must match
fn glob_matches(pattern: &str, url: &str) -> bool {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    regex::Regex::new(&format!("^{body}$"))
        .map(|re| re.is_match(url))
        .unwrap_or(false)
}

/// How a captured call ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutcome {
    /// Call has not resolved yet
    Pending,
    /// Resolved with a response
    Responded {
        /// HTTP status code
        status: u16,
    },
    /// Rejected with an error
    Failed {
        /// Error message
        message: String,
    },
}

/// A captured call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedRequest {
    /// Unique id of this call
    pub id: String,
    /// Asset name or URL
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Whether the descriptor was a bare asset name
    pub asset: bool,
    /// Milliseconds since the journal started
    pub timestamp_ms: u64,
    /// Outcome
    pub outcome: CallOutcome,
}

/// Records every call made through the wrapped network
#[derive(Debug)]
pub struct RecordingFetch<F> {
    inner: F,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    start_time: Instant,
}

impl<F: Fetch> RecordingFetch<F> {
    /// Wrap a network
    #[must_use]
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            captured: Arc::new(Mutex::new(Vec::new())),
            start_time: Instant::now(),
        }
    }

    /// The wrapped network
    #[must_use]
    pub const fn inner(&self) -> &F {
        &self.inner
    }

    fn record(&self, descriptor: &RequestDescriptor) -> String {
        let id = Uuid::new_v4().to_string();
        let request = CapturedRequest {
            id: id.clone(),
            url: descriptor.target().to_string(),
            method: descriptor.method(),
            asset: descriptor.is_asset(),
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            outcome: CallOutcome::Pending,
        };
        if let Ok(mut captured) = self.captured.lock() {
            captured.push(request);
        }
        id
    }

    fn settle(&self, id: &str, outcome: CallOutcome) {
        if let Ok(mut captured) = self.captured.lock() {
            if let Some(request) = captured.iter_mut().find(|r| r.id == id) {
                request.outcome = outcome;
            }
        }
    }

    /// Get all captured requests in issue order
    #[must_use]
    pub fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Get captured requests matching a URL pattern
    #[must_use]
    pub fn requests_matching(&self, pattern: &UrlPattern) -> Vec<CapturedRequest> {
        self.captured_requests()
            .into_iter()
            .filter(|r| pattern.matches(&r.url))
            .collect()
    }

    /// Assert a request was made
    pub fn assert_requested(&self, pattern: &UrlPattern) -> FakeApiResult<()> {
        if self.requests_matching(pattern).is_empty() {
            return Err(FakeApiError::assertion(format!(
                "Expected request matching {pattern}, but none found"
            )));
        }
        Ok(())
    }

    /// Assert a request was made N times
    pub fn assert_requested_times(&self, pattern: &UrlPattern, times: usize) -> FakeApiResult<()> {
        let found = self.requests_matching(pattern).len();
        if found != times {
            return Err(FakeApiError::assertion(format!(
                "Expected {times} requests matching {pattern}, but found {found}"
            )));
        }
        Ok(())
    }

    /// Assert no requests were made matching a pattern
    pub fn assert_not_requested(&self, pattern: &UrlPattern) -> FakeApiResult<()> {
        let found = self.requests_matching(pattern).len();
        if found != 0 {
            return Err(FakeApiError::assertion(format!(
                "Expected no requests matching {pattern}, but found {found}"
            )));
        }
        Ok(())
    }

    /// Clear captured requests
    pub fn clear(&self) {
        if let Ok(mut captured) = self.captured.lock() {
            captured.clear();
        }
    }
}

#[async_trait]
impl<F: Fetch> Fetch for RecordingFetch<F> {
    async fn fetch(&self, request: RequestDescriptor) -> FakeApiResult<FetchResponse> {
        let id = self.record(&request);
        let result = self.inner.fetch(request).await;
        let outcome = match &result {
            Ok(response) => CallOutcome::Responded {
                status: response.status,
            },
            Err(err) => CallOutcome::Failed {
                message: err.to_string(),
            },
        };
        self.settle(&id, outcome);
        result
    }
}
