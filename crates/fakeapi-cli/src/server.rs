//! Fake Homeserver Server
//!
//! Exposes the mock responder over HTTP so a real browser running daydream
//! can log in and sync against it.
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────┐
//! │ Browser  │─────────►│ axum fallback                │
//! │ daydream │          │  /…/daydream.wasm ─► Asset   │──► DirectoryFetch
//! │          │◄─────────│  anything else    ─► Request │──► fixtures
//! └──────────┘          └──────────────────────────────┘
//! ```

use crate::error::{CliError, CliResult};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use daydream_fakeapi::{
    join_url, ApiRequest, FakeApiError, Fetch, FetchResponse, HttpMethod, MockResponder,
    RequestDescriptor, ResponderConfig,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Port the daydream login form defaults to
pub const DEFAULT_PORT: u16 = 8448;

/// Turn an incoming HTTP request into the descriptor the application issued.
///
/// A GET or HEAD whose last path segment is the asset name is the bare asset fetch;
/// everything else is addressed at the configured homeserver URL.
pub fn descriptor_for(
    config: &ResponderConfig,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &Bytes,
) -> RequestDescriptor {
    let last_segment = uri.path().rsplit('/').next().unwrap_or_default();
    let reads = *method == Method::GET || *method == Method::HEAD;
    if reads && last_segment == config.asset_name {
        return RequestDescriptor::asset(last_segment);
    }

    let path_and_query = uri
        .path_and_query()
        .map_or_else(|| uri.path(), |pq| pq.as_str());
    let mut request = ApiRequest::new(
        HttpMethod::parse(method.as_str()).unwrap_or_default(),
        join_url(&config.homeserver_url, path_and_query),
    );
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    if !body.is_empty() {
        request = request.with_body(body.to_vec());
    }
    RequestDescriptor::Request(request)
}

fn into_http_response(response: FetchResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);
    for (name, value) in &response.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn error_response(err: &FakeApiError) -> Response {
    let (status, errcode) = match err {
        FakeApiError::UnroutableRequest { .. } => (StatusCode::NOT_FOUND, "M_UNRECOGNIZED"),
        FakeApiError::Network { .. } => (StatusCode::BAD_GATEWAY, "M_UNKNOWN"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "M_UNKNOWN"),
    };
    (
        status,
        Json(json!({ "errcode": errcode, "error": err.to_string() })),
    )
        .into_response()
}

async fn intercept<N: Fetch + 'static>(
    State(responder): State<Arc<MockResponder<N>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let descriptor = descriptor_for(responder.config(), &method, &uri, &headers, &body);
    match responder.handle(descriptor).await {
        Ok(response) => into_http_response(response),
        Err(err) => {
            error!(%method, %uri, error = %err, "request failed");
            error_response(&err)
        }
    }
}

/// Build the router answering every path through `responder`
pub fn router<N: Fetch + 'static>(responder: Arc<MockResponder<N>>) -> Router {
    Router::new()
        .fallback(intercept::<N>)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(responder)
}

/// Fake homeserver bound to a port
#[derive(Debug)]
pub struct FakeHomeserver<N> {
    responder: Arc<MockResponder<N>>,
    port: u16,
}

impl<N: Fetch + 'static> FakeHomeserver<N> {
    /// Create a server for `responder`
    pub fn new(responder: MockResponder<N>, port: u16) -> Self {
        Self {
            responder: Arc::new(responder),
            port,
        }
    }

    /// Get the HTTP URL
    #[must_use]
    pub fn http_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Serve until Ctrl+C
    pub async fn run(&self) -> CliResult<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| CliError::server(format!("cannot bind {addr}: {e}")))?;

        let config = self.responder.config();
        println!("{}", console::style("daydream fake homeserver").bold().green());
        println!("  Listening:  {}", self.http_url());
        println!("  Login:      {}", config.login_endpoint());
        println!("  Asset:      {}", config.asset_name);
        println!("  Sync delay: {} ms", config.sync_delay_ms);
        println!("  Press Ctrl+C to stop");
        info!(%addr, "fake homeserver ready");

        axum::serve(listener, router(Arc::clone(&self.responder)))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;
        Ok(())
    }
}
