//! Homeserver client.
//!
//! The application side of the network seam: it takes its [`Fetch`] at
//! construction, so a test hands it a [`MockResponder`](crate::MockResponder)
//! and production hands it the real network. Nothing here knows which one it
//! talks to.

use crate::config::{join_url, LOGIN_PATH, SYNC_PATH};
use crate::fixture::{Credentials, SyncSnapshot};
use crate::network::{ApiRequest, Fetch, FetchResponse, HttpMethod, RequestDescriptor};
use crate::result::{FakeApiError, FakeApiResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use url::Url;

/// A logged in session, replayable without logging in again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Homeserver the credentials belong to
    pub homeserver_url: String,
    /// Fully qualified user id
    pub user_id: String,
    /// Bearer token
    pub access_token: String,
    /// Device id
    pub device_id: String,
}

impl Session {
    /// Bind credentials to a homeserver
    #[must_use]
    pub fn new(homeserver_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            homeserver_url: homeserver_url.into(),
            user_id: credentials.user_id,
            access_token: credentials.access_token,
            device_id: credentials.device_id,
        }
    }
}

/// Minimal Matrix client speaking through an injected network
#[derive(Debug)]
pub struct HomeserverClient<F> {
    fetch: F,
    homeserver_url: String,
    session: Option<Session>,
}

impl<F: Fetch> HomeserverClient<F> {
    /// Create a logged out client
    pub fn new(fetch: F, homeserver_url: impl Into<String>) -> Self {
        Self {
            fetch,
            homeserver_url: homeserver_url.into(),
            session: None,
        }
    }

    /// Create a client from a stored session
    pub fn restore(fetch: F, session: Session) -> Self {
        info!(user_id = %session.user_id, "restoring session");
        Self {
            fetch,
            homeserver_url: session.homeserver_url.clone(),
            session: Some(session),
        }
    }

    /// Returns the homeserver URL
    pub fn homeserver_url(&self) -> &str {
        &self.homeserver_url
    }

    /// Current session, if logged in
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The injected network
    pub const fn network(&self) -> &F {
        &self.fetch
    }

    /// Log in with a password
    pub async fn login(&mut self, user: &str, password: &str) -> FakeApiResult<Session> {
        let url = join_url(&self.homeserver_url, LOGIN_PATH);
        let body = json!({
            "type": "m.login.password",
            "user": user,
            "password": password,
        });
        let response = self
            .send(RequestDescriptor::post_json(url.as_str(), &body)?, &url)
            .await?;
        let credentials: Credentials = response.body_json()?;
        let session = Session::new(self.homeserver_url.clone(), credentials);
        info!(user_id = %session.user_id, device_id = %session.device_id, "logged in");
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Fetch a sync snapshot, optionally incremental from `since`
    pub async fn sync(&self, since: Option<&str>) -> FakeApiResult<SyncSnapshot> {
        let session = self.session.as_ref().ok_or(FakeApiError::NotLoggedIn)?;
        let url = sync_url(&self.homeserver_url, since)?;
        let request = ApiRequest::new(HttpMethod::Get, url.as_str()).with_header(
            "Authorization",
            &format!("Bearer {}", session.access_token),
        );
        let response = self.send(request.into(), &url).await?;
        let snapshot: SyncSnapshot = response.body_json()?;
        debug!(
            next_batch = %snapshot.next_batch,
            joined = snapshot.rooms.join.len(),
            invited = snapshot.rooms.invite.len(),
            "synced"
        );
        Ok(snapshot)
    }

    /// Fetch the compiled application module by its bare name
    pub async fn load_module(&self, asset: &str) -> FakeApiResult<Vec<u8>> {
        let response = self.fetch.fetch(RequestDescriptor::asset(asset)).await?;
        if !response.is_success() {
            return Err(FakeApiError::Status {
                status: response.status,
                url: asset.to_string(),
            });
        }
        Ok(response.body)
    }

    async fn send(&self, request: RequestDescriptor, url: &str) -> FakeApiResult<FetchResponse> {
        let response = self.fetch.fetch(request).await?;
        if response.url != url {
            return Err(FakeApiError::ResponseUrlMismatch {
                expected: url.to_string(),
                actual: response.url,
            });
        }
        if !response.is_success() {
            return Err(FakeApiError::Status {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

/// Sync endpoint with `since` form-encoded into the query
fn sync_url(homeserver_url: &str, since: Option<&str>) -> FakeApiResult<String> {
    let base = join_url(homeserver_url, SYNC_PATH);
    let Some(since) = since else {
        return Ok(base);
    };
    let mut url = Url::parse(&base).map_err(|e| {
        FakeApiError::config(format!("invalid homeserver URL {homeserver_url:?}: {e}"))
    })?;
    url.query_pairs_mut().append_pair("since", since);
    Ok(url.into())
}
