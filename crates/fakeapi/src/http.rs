//! Real network access over HTTP.
//!
//! Bare asset names are resolved against a base URL the same way a browser
//! resolves them against the page that requested them.

use crate::config::join_url;
use crate::network::{Fetch, FetchResponse, HttpMethod, RequestDescriptor};
use crate::result::{FakeApiError, FakeApiResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

/// The real network, backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetch {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpFetch {
    /// Create a client without a base URL
    pub fn new() -> FakeApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FakeApiError::config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self::with_client(client))
    }

    /// Create with a custom reqwest client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    /// Resolve bare asset names against `base_url`
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Returns the base URL
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Absolute URL a descriptor resolves to
    pub fn resolve(&self, descriptor: &RequestDescriptor) -> FakeApiResult<String> {
        match descriptor {
            RequestDescriptor::Request(request) => Ok(request.url.clone()),
            RequestDescriptor::Asset(name) => match &self.base_url {
                Some(base) => Ok(join_url(base, name)),
                None => Err(FakeApiError::network(
                    name.as_str(),
                    "bare asset name without a base URL",
                )),
            },
        }
    }
}

const fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}

// Repeated headers are joined with ", "; non-UTF-8 bytes are kept lossily
fn collect_headers(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    collected
}

#[async_trait]
impl Fetch for HttpFetch {
    async fn fetch(&self, request: RequestDescriptor) -> FakeApiResult<FetchResponse> {
        let url = self.resolve(&request)?;
        let mut builder = self
            .client
            .request(reqwest_method(request.method()), url.as_str());
        if let RequestDescriptor::Request(api) = request {
            for (key, value) in &api.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }
            if let Some(body) = api.body {
                builder = builder.body(body);
            }
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| FakeApiError::network(url.as_str(), e.to_string()))?;

        let status = resp.status();
        let final_url = resp.url().to_string();
        let headers = collect_headers(resp.headers());
        let body = resp
            .bytes()
            .await
            .map_err(|e| FakeApiError::network(url.as_str(), e.to_string()))?;

        let mut response = FetchResponse::new(final_url, status.as_u16())
            .with_body(body.to_vec())
            .with_status_text(status.canonical_reason().unwrap_or_default());
        response.headers = headers;
        Ok(response)
    }
}
