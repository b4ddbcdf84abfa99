//! daydream-fakeapi: a deterministic fake Matrix homeserver for end-to-end tests
//!
//! The daydream client takes its network as a [`Fetch`] at construction. Under
//! test it is handed a [`MockResponder`] instead, which answers from fixtures:
//!
//! ```text
//! ┌──────────────┐  fetch   ┌───────────────┐  asset   ┌──────────────┐
//! │ Application  │─────────►│ MockResponder │─────────►│ Real network │
//! │ (HomeServer  │◄─────────│               │          └──────────────┘
//! │  Client)     │ response │  login ─► now │
//! └──────────────┘          │  other ─► 2 s │──► fixture
//!                           └───────────────┘
//! ```
//!
//! ```no_run
//! use daydream_fakeapi::{HomeserverClient, MockResponder, OfflineNetwork};
//!
//! # async fn demo() -> daydream_fakeapi::FakeApiResult<()> {
//! let responder = MockResponder::with_defaults(OfflineNetwork);
//! let mut client = HomeserverClient::new(responder, "http://localhost:8448");
//! client.login("@carl:example.com", "12345").await?;
//! let snapshot = client.sync(None).await?;
//! assert!(snapshot.search_rooms("Alice").len() == 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
mod config;
/// Hand-authored homeserver payloads
pub mod fixture;
#[cfg(feature = "http")]
mod http;
mod journal;
mod network;
mod responder;
mod result;

pub use client::{HomeserverClient, Session};
pub use config::{
    join_url, ResponderConfig, DEFAULT_ASSET_NAME, DEFAULT_HOMESERVER_URL, DEFAULT_SYNC_DELAY_MS,
    LOGIN_PATH, MAX_SYNC_DELAY_MS, SYNC_PATH,
};
pub use fixture::{Credentials, FixtureKind, SyncSnapshot};
#[cfg(feature = "http")]
pub use http::HttpFetch;
pub use journal::{CallOutcome, CapturedRequest, RecordingFetch, UrlPattern};
pub use network::{
    status_text_for, ApiRequest, Fetch, FetchResponse, HttpMethod, OfflineNetwork,
    RequestDescriptor, JSON_CONTENT_TYPE,
};
pub use responder::{Disposition, MockResponder};
pub use result::{FakeApiError, FakeApiResult};
