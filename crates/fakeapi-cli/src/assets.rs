//! Directory-backed network for the pass-through asset.
//!
//! Plays the part of the web server that hosts the compiled module, so the
//! fake homeserver can pass `daydream.wasm` through without a second process.

use async_trait::async_trait;
use daydream_fakeapi::{FakeApiError, FakeApiResult, Fetch, FetchResponse, RequestDescriptor};
use std::path::{Component, Path, PathBuf};

/// MIME type for a file, with wasm pinned so streaming compilation works
#[must_use]
pub fn get_mime_type(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some("wasm") => "application/wasm".to_string(),
        _ => mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string(),
    }
}

/// Serves bare asset names from a directory
#[derive(Debug, Clone)]
pub struct DirectoryFetch {
    root: PathBuf,
}

impl DirectoryFetch {
    /// Serve from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory being served
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, name: &str) -> FakeApiResult<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if name.is_empty() || escapes {
            return Err(FakeApiError::network(
                name,
                "asset name escapes the asset directory",
            ));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl Fetch for DirectoryFetch {
    async fn fetch(&self, request: RequestDescriptor) -> FakeApiResult<FetchResponse> {
        let name = match request {
            RequestDescriptor::Asset(name) => name,
            RequestDescriptor::Request(request) => {
                return Err(FakeApiError::network(
                    request.url,
                    "asset directory only serves bare asset names",
                ));
            }
        };
        let path = self.locate(&name)?;
        let url = format!("file://{}", path.display());
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(FetchResponse::new(url, 200)
                .with_header("Content-type", &get_mime_type(&path))
                .with_body(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FetchResponse::new(url, 404)
                .with_header("Content-type", "text/plain")
                .with_body(format!("{name} not found").into_bytes())),
            Err(e) => Err(FakeApiError::network(url, e.to_string())),
        }
    }
}
