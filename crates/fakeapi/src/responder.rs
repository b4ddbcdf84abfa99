//! Mock Responder
//!
//! Intercepts every call the application makes while under test and decides
//! how to answer it:
//!
//! ```text
//! received ──► classified ──┬─► pass-through ─────► real network ──┐
//!                           ├─► respond now ──────► login fixture ─┼─► resolved
//!                           └─► respond after delay ► sync fixture ┘
//! ```
//!
//! The responder is immutable after construction. Each call is its own
//! future; a pending delayed sync never blocks other calls.

use crate::config::ResponderConfig;
use crate::fixture::FixtureKind;
use crate::network::{Fetch, FetchResponse, RequestDescriptor};
use crate::result::{FakeApiError, FakeApiResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How an intercepted call is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Forward to the real network unchanged
    PassThrough,
    /// Answer with a fixture immediately
    Respond(FixtureKind),
    /// Answer with a fixture once `delay` has elapsed
    RespondAfter {
        /// Fixture to answer with
        fixture: FixtureKind,
        /// Artificial latency
        delay: Duration,
    },
}

impl Disposition {
    /// Fixture this disposition answers with, if any
    #[must_use]
    pub const fn fixture(&self) -> Option<FixtureKind> {
        match self {
            Self::PassThrough => None,
            Self::Respond(fixture) | Self::RespondAfter { fixture, .. } => Some(*fixture),
        }
    }
}

/// Drop-in replacement for the application's network function.
///
/// Owns the real network it passes the application's own binary asset to;
/// everything else is answered from fixtures.
#[derive(Debug, Clone)]
pub struct MockResponder<N> {
    network: N,
    config: ResponderConfig,
    login_endpoint: String,
}

impl<N: Fetch> MockResponder<N> {
    /// Create a responder with a validated configuration
    pub fn new(network: N, config: ResponderConfig) -> FakeApiResult<Self> {
        config.validate()?;
        let login_endpoint = config.login_endpoint();
        Ok(Self {
            network,
            config,
            login_endpoint,
        })
    }

    /// Create a responder with the default configuration
    #[must_use]
    pub fn with_defaults(network: N) -> Self {
        let config = ResponderConfig::default();
        let login_endpoint = config.login_endpoint();
        Self {
            network,
            config,
            login_endpoint,
        }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &ResponderConfig {
        &self.config
    }

    /// The wrapped real network
    #[must_use]
    pub const fn network(&self) -> &N {
        &self.network
    }

    /// Decide how a descriptor is answered. First match wins.
    pub fn classify(&self, descriptor: &RequestDescriptor) -> FakeApiResult<Disposition> {
        match descriptor {
            RequestDescriptor::Asset(name) if *name == self.config.asset_name => {
                Ok(Disposition::PassThrough)
            }
            RequestDescriptor::Asset(_) => Err(FakeApiError::UnroutableRequest {
                descriptor: format!("{descriptor:?}"),
            }),
            RequestDescriptor::Request(request) if request.url == self.login_endpoint => {
                Ok(Disposition::Respond(FixtureKind::Login))
            }
            RequestDescriptor::Request(_) => Ok(Disposition::RespondAfter {
                fixture: FixtureKind::Sync,
                delay: self.config.sync_delay(),
            }),
        }
    }

    /// Answer an intercepted call
    pub async fn handle(&self, descriptor: RequestDescriptor) -> FakeApiResult<FetchResponse> {
        debug!(
            url = %descriptor.target(),
            method = %descriptor.method(),
            asset = descriptor.is_asset(),
            "request intercepted"
        );

        let disposition = match self.classify(&descriptor) {
            Ok(disposition) => disposition,
            Err(err) => {
                warn!(url = %descriptor.target(), "no route for request");
                return Err(err);
            }
        };

        match disposition {
            Disposition::PassThrough => {
                debug!(url = %descriptor.target(), "passing through to real network");
                self.network.fetch(descriptor).await
            }
            Disposition::Respond(fixture) => {
                info!(url = %descriptor.target(), fixture = fixture.as_str(), "handling");
                fixture.build(descriptor.target())
            }
            Disposition::RespondAfter { fixture, delay } => {
                info!(
                    url = %descriptor.target(),
                    fixture = fixture.as_str(),
                    delay_ms = delay.as_millis() as u64,
                    "handling after delay"
                );
                let response = fixture.build(descriptor.target())?;
                tokio::time::sleep(delay).await;
                Ok(response)
            }
        }
    }
}

#[async_trait]
impl<N: Fetch> Fetch for MockResponder<N> {
    async fn fetch(&self, request: RequestDescriptor) -> FakeApiResult<FetchResponse> {
        self.handle(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::network::{ApiRequest, HttpMethod, OfflineNetwork};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    const LOGIN: &str = "http://localhost:8448/_matrix/client/r0/login";
    const SYNC: &str = "http://localhost:8448/_matrix/client/r0/sync";

    /// Serves a fixed body for every call and counts calls
    #[derive(Debug, Default)]
    struct CountingNetwork {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetch for CountingNetwork {
        async fn fetch(&self, request: RequestDescriptor) -> FakeApiResult<FetchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchResponse::new(format!("http://localhost:8000/{}", request.target()), 200)
                .with_header("Content-type", "application/wasm")
                .with_body(vec![0x00, 0x61, 0x73, 0x6d]))
        }
    }

    fn responder() -> MockResponder<CountingNetwork> {
        MockResponder::with_defaults(CountingNetwork::default())
    }

    mod classify_tests {
        use super::*;

        #[test]
        fn test_asset_passes_through() {
            let disposition = responder()
                .classify(&RequestDescriptor::asset("daydream.wasm"))
                .unwrap();
            assert_eq!(disposition, Disposition::PassThrough);
            assert_eq!(disposition.fixture(), None);
        }

        #[test]
        fn test_unknown_asset_is_unroutable() {
            let err = responder()
                .classify(&RequestDescriptor::asset("favicon.ico"))
                .unwrap_err();
            assert!(matches!(err, FakeApiError::UnroutableRequest { .. }));
            assert!(err.to_string().contains("favicon.ico"));
        }

        #[test]
        fn test_login_is_immediate() {
            let disposition = responder()
                .classify(&RequestDescriptor::post_json(LOGIN, &serde_json::json!({})).unwrap())
                .unwrap();
            assert_eq!(disposition, Disposition::Respond(FixtureKind::Login));
        }

        #[test]
        fn test_login_requires_exact_match() {
            let disposition = responder()
                .classify(&RequestDescriptor::get(format!("{LOGIN}/")))
                .unwrap();
            assert_eq!(disposition.fixture(), Some(FixtureKind::Sync));
        }

        #[test]
        fn test_everything_else_is_delayed_sync() {
            let disposition = responder().classify(&RequestDescriptor::get(SYNC)).unwrap();
            assert_eq!(
                disposition,
                Disposition::RespondAfter {
                    fixture: FixtureKind::Sync,
                    delay: Duration::from_millis(2000),
                }
            );
        }

        #[test]
        fn test_custom_config_routes() {
            let config = ResponderConfig::new()
                .with_homeserver_url("http://hs.test")
                .with_asset_name("app.wasm")
                .with_sync_delay_ms(0);
            let responder = MockResponder::new(OfflineNetwork, config).unwrap();
            assert_eq!(
                responder.classify(&"app.wasm".into()).unwrap(),
                Disposition::PassThrough
            );
            assert!(responder.classify(&"daydream.wasm".into()).is_err());
            assert_eq!(
                responder
                    .classify(&RequestDescriptor::get("http://hs.test/_matrix/client/r0/login"))
                    .unwrap(),
                Disposition::Respond(FixtureKind::Login)
            );
        }

        #[test]
        fn test_invalid_config_is_rejected() {
            let config = ResponderConfig::new().with_asset_name("");
            assert!(MockResponder::new(OfflineNetwork, config).is_err());
        }
    }

    mod handle_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_login_resolves_immediately() {
            let responder = responder();
            let start = Instant::now();
            let response = responder
                .handle(RequestDescriptor::Request(ApiRequest::new(HttpMethod::Post, LOGIN)))
                .await
                .unwrap();
            assert!(start.elapsed() < Duration::from_millis(50));
            assert_eq!(response.status, 200);
            assert_eq!(response.url, LOGIN);
            assert!(response.body_string().contains("\"access_token\": \"123456\""));
            assert_eq!(responder.network().calls.load(Ordering::SeqCst), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_sync_resolves_after_delay() {
            let responder = responder();
            let start = Instant::now();
            let response = responder.handle(RequestDescriptor::get(SYNC)).await.unwrap();
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(1500));
            assert!(elapsed <= Duration::from_secs(5));
            assert_eq!(response.url, SYNC);
            assert!(response.body_string().contains("Alice Margatroid"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_asset_is_forwarded_unmodified() {
            let responder = responder();
            let direct = responder
                .network()
                .fetch(RequestDescriptor::asset("daydream.wasm"))
                .await
                .unwrap();
            let via_mock = responder
                .handle(RequestDescriptor::asset("daydream.wasm"))
                .await
                .unwrap();
            assert_eq!(via_mock, direct);
            assert_eq!(responder.network().calls.load(Ordering::SeqCst), 2);
        }

        #[tokio::test]
        async fn test_pass_through_error_propagates() {
            let responder = MockResponder::with_defaults(OfflineNetwork);
            let err = responder
                .handle(RequestDescriptor::asset("daydream.wasm"))
                .await
                .unwrap_err();
            match err {
                FakeApiError::Network { url, message } => {
                    assert_eq!(url, "daydream.wasm");
                    assert_eq!(message, "network is offline");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_unroutable_rejects_instead_of_hanging() {
            let responder = responder();
            let result = responder.handle(RequestDescriptor::asset("style.css")).await;
            assert!(matches!(result, Err(FakeApiError::UnroutableRequest { .. })));
            assert_eq!(responder.network().calls.load(Ordering::SeqCst), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_later_login_overtakes_pending_sync() {
            let responder = responder();
            let start = Instant::now();
            let sync = async {
                responder.handle(RequestDescriptor::get(SYNC)).await.unwrap();
                start.elapsed()
            };
            let login = async {
                tokio::task::yield_now().await;
                responder.handle(RequestDescriptor::get(LOGIN)).await.unwrap();
                start.elapsed()
            };
            let (sync_done, login_done) = tokio::join!(sync, login);
            assert!(login_done < sync_done);
            assert!(sync_done >= Duration::from_millis(2000));
        }

        #[tokio::test(start_paused = true)]
        async fn test_fetch_trait_delegates_to_handle() {
            let responder = responder();
            let network: &dyn Fetch = &responder;
            let response = network.fetch(RequestDescriptor::get(LOGIN)).await.unwrap();
            assert_eq!(response.url, LOGIN);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_structured_requests_always_route(url in "\\PC{0,64}") {
                let disposition = responder().classify(&RequestDescriptor::get(url.clone()));
                prop_assert!(disposition.is_ok());
                let expected = if url == LOGIN { FixtureKind::Login } else { FixtureKind::Sync };
                prop_assert_eq!(disposition.unwrap().fixture(), Some(expected));
            }

            #[test]
            fn prop_fixture_url_echoes_request(url in "https?://[a-z]{1,12}(:[0-9]{2,5})?(/[a-zA-Z0-9_?=&.-]{0,16}){0,4}") {
                for kind in [FixtureKind::Login, FixtureKind::Sync] {
                    let response = kind.build(&url).unwrap();
                    prop_assert_eq!(&response.url, &url);
                }
            }

            #[test]
            fn prop_other_assets_are_unroutable(name in "[a-z]{1,10}\\.(js|css|png|html)") {
                prop_assert!(responder().classify(&RequestDescriptor::asset(name)).is_err());
            }
        }
    }
}
