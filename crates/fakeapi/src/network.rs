//! Network Seam
//!
//! The request/response vocabulary shared by the application, the real
//! network and the mock responder, and the [`Fetch`] trait through which the
//! network is injected.
//!
//! - **Poka-Yoke**: a descriptor is either a bare asset name or a structured
//!   request, never something in between
//! - **Jidoka**: responses carry their resolved URL from construction

use crate::result::{FakeApiError, FakeApiResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Content type used by every fixture
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP methods a client may issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET request
    #[default]
    Get,
    /// POST request
    Post,
    /// PUT request
    Put,
    /// DELETE request
    Delete,
    /// PATCH request
    Patch,
    /// HEAD request
    Head,
    /// OPTIONS request
    Options,
}

impl HttpMethod {
    /// Parse from string, case-insensitively
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    /// Convert to string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured outbound request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Target URL
    pub url: String,
    /// HTTP method
    #[serde(default)]
    pub method: HttpMethod,
    /// Request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Create a request without headers or body
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    /// Set a raw body
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Set a JSON body and content type
    pub fn with_json<T: Serialize>(mut self, data: &T) -> FakeApiResult<Self> {
        self.body = Some(serde_json::to_vec(data)?);
        self.headers
            .insert("Content-type".to_string(), JSON_CONTENT_TYPE.to_string());
        Ok(self)
    }

    /// Look up a header, ignoring case
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup_header(&self.headers, name)
    }
}

/// Identity of an outbound call.
///
/// Mirrors what a browser `fetch` accepts: either a bare resource name that is
/// resolved against the page, or a structured request with an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestDescriptor {
    /// Bare resource identifier such as `daydream.wasm`
    Asset(String),
    /// Structured request
    Request(ApiRequest),
}

impl RequestDescriptor {
    /// Bare asset descriptor
    #[must_use]
    pub fn asset(name: impl Into<String>) -> Self {
        Self::Asset(name.into())
    }

    /// Structured GET descriptor
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::Request(ApiRequest::new(HttpMethod::Get, url))
    }

    /// Structured POST descriptor carrying a JSON body
    pub fn post_json<T: Serialize>(url: impl Into<String>, data: &T) -> FakeApiResult<Self> {
        Ok(Self::Request(
            ApiRequest::new(HttpMethod::Post, url).with_json(data)?,
        ))
    }

    /// The asset name or the request URL
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Asset(name) => name,
            Self::Request(request) => &request.url,
        }
    }

    /// Whether this is a bare asset descriptor
    #[must_use]
    pub const fn is_asset(&self) -> bool {
        matches!(self, Self::Asset(_))
    }

    /// Method of the call; bare assets are fetched with GET
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        match self {
            Self::Asset(_) => HttpMethod::Get,
            Self::Request(request) => request.method,
        }
    }
}

impl From<&str> for RequestDescriptor {
    fn from(name: &str) -> Self {
        Self::Asset(name.to_string())
    }
}

impl From<ApiRequest> for RequestDescriptor {
    fn from(request: ApiRequest) -> Self {
        Self::Request(request)
    }
}

/// A response as observed by the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase
    pub status_text: String,
    /// Response headers
    pub headers: BTreeMap<String, String>,
    /// Response body
    pub body: Vec<u8>,
    /// Effective URL of the response
    pub url: String,
}

impl FetchResponse {
    /// Create an empty response for `url`
    #[must_use]
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self {
            status,
            status_text: status_text_for(status).to_string(),
            headers: BTreeMap::new(),
            body: Vec::new(),
            url: url.into(),
        }
    }

    /// Create a pretty-printed JSON response for `url`
    pub fn json<T: Serialize>(url: impl Into<String>, status: u16, data: &T) -> FakeApiResult<Self> {
        let body = serde_json::to_vec_pretty(data)?;
        Ok(Self::new(url, status)
            .with_header("Content-type", JSON_CONTENT_TYPE)
            .with_body(body))
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    /// Set body
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Override the reason phrase
    #[must_use]
    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    /// Whether the status is 2xx
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Look up a header, ignoring case
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup_header(&self.headers, name)
    }

    /// Content type header, if any
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get body as string
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse body as JSON
    pub fn body_json<T: for<'de> Deserialize<'de>>(&self) -> FakeApiResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Reason phrase for the status codes the fake API produces
#[must_use]
pub const fn status_text_for(status: u16) -> &'static str {
    match status {
        200 => "Ok",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "",
    }
}

fn lookup_header<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// A network function.
///
/// The application receives one of these at construction instead of reaching
/// for a global. Tests hand it a [`MockResponder`](crate::MockResponder).
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Issue a call and wait for its response
    async fn fetch(&self, request: RequestDescriptor) -> FakeApiResult<FetchResponse>;
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for Arc<T> {
    async fn fetch(&self, request: RequestDescriptor) -> FakeApiResult<FetchResponse> {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for Box<T> {
    async fn fetch(&self, request: RequestDescriptor) -> FakeApiResult<FetchResponse> {
        (**self).fetch(request).await
    }
}

/// A network that is never reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNetwork;

#[async_trait]
impl Fetch for OfflineNetwork {
    async fn fetch(&self, request: RequestDescriptor) -> FakeApiResult<FetchResponse> {
        Err(FakeApiError::network(request.target(), "network is offline"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod http_method_tests {
        use super::*;

        #[test]
        fn test_parse() {
            assert_eq!(HttpMethod::parse("GET"), Some(HttpMethod::Get));
            assert_eq!(HttpMethod::parse("post"), Some(HttpMethod::Post));
            assert_eq!(HttpMethod::parse("Options"), Some(HttpMethod::Options));
            assert_eq!(HttpMethod::parse("BREW"), None);
        }

        #[test]
        fn test_as_str() {
            assert_eq!(HttpMethod::Get.as_str(), "GET");
            assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        }
    }

    mod descriptor_tests {
        use super::*;

        #[test]
        fn test_bare_string_deserializes_as_asset() {
            let descriptor: RequestDescriptor = serde_json::from_str("\"daydream.wasm\"").unwrap();
            assert_eq!(descriptor, RequestDescriptor::asset("daydream.wasm"));
            assert!(descriptor.is_asset());
        }

        #[test]
        fn test_object_deserializes_as_request() {
            let descriptor: RequestDescriptor =
                serde_json::from_str(r#"{"url": "http://localhost:8448/_matrix/client/r0/sync"}"#)
                    .unwrap();
            match &descriptor {
                RequestDescriptor::Request(request) => {
                    assert_eq!(request.method, HttpMethod::Get);
                    assert!(request.headers.is_empty());
                }
                RequestDescriptor::Asset(_) => panic!("expected structured request"),
            }
            assert_eq!(
                descriptor.target(),
                "http://localhost:8448/_matrix/client/r0/sync"
            );
        }

        #[test]
        fn test_post_json_sets_content_type() {
            let descriptor =
                RequestDescriptor::post_json("http://x/login", &serde_json::json!({"a": 1}))
                    .unwrap();
            let RequestDescriptor::Request(request) = descriptor else {
                panic!("expected structured request");
            };
            assert_eq!(request.method, HttpMethod::Post);
            assert_eq!(request.header("content-type"), Some(JSON_CONTENT_TYPE));
            assert_eq!(request.body.as_deref(), Some(br#"{"a":1}"#.as_slice()));
        }

        #[test]
        fn test_asset_method_is_get() {
            assert_eq!(RequestDescriptor::from("x.js").method(), HttpMethod::Get);
        }
    }

    mod fetch_response_tests {
        use super::*;

        #[test]
        fn test_new_uses_reason_phrase() {
            let response = FetchResponse::new("http://x", 404);
            assert_eq!(response.status_text, "Not Found");
            assert!(!response.is_success());
        }

        #[test]
        fn test_json_is_pretty_and_typed() {
            let response =
                FetchResponse::json("http://x", 200, &serde_json::json!({"access_token": "1"}))
                    .unwrap();
            assert_eq!(response.status_text, "Ok");
            assert_eq!(response.content_type(), Some(JSON_CONTENT_TYPE));
            assert!(response.body_string().contains("\"access_token\": \"1\""));
            assert_eq!(response.url, "http://x");
        }

        #[test]
        fn test_header_lookup_ignores_case() {
            let response = FetchResponse::new("u", 200).with_header("Content-type", "text/plain");
            assert_eq!(response.header("CONTENT-TYPE"), Some("text/plain"));
            assert_eq!(response.header("x-missing"), None);
        }

        #[test]
        fn test_body_json() {
            let response = FetchResponse::new("u", 200).with_body(b"{\"n\": 3}".to_vec());
            let value: serde_json::Value = response.body_json().unwrap();
            assert_eq!(value["n"], 3);
        }
    }

    mod offline_tests {
        use super::*;

        #[tokio::test]
        async fn test_offline_network_fails_with_target() {
            let err = OfflineNetwork
                .fetch(RequestDescriptor::asset("daydream.wasm"))
                .await
                .unwrap_err();
            match err {
                FakeApiError::Network { url, .. } => assert_eq!(url, "daydream.wasm"),
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_arc_forwarding() {
            let network: Arc<dyn Fetch> = Arc::new(OfflineNetwork);
            assert!(network.fetch(RequestDescriptor::get("http://x")).await.is_err());
        }
    }
}
