//! Common test utilities for Vitrine
//!
//! Builds a storefront wired to wiremock backends with a manual clock and an
//! in-memory marker store, plus an axum-test server around it.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use chrono::Utc;
use vitrine::{
    backend::{FallbackChain, LegacyClient, PostgrestClient, PrimaryBackend, RetryPolicy},
    cache::InMemoryMarkerStore,
    clock::ManualClock,
    routes::create_router,
    AppState, Config, Storefront, StorefrontOptions,
};

use crate::mocks::{MockLegacyServer, MockPrimaryServer, TEST_PRIMARY_API_KEY};

pub const TEST_CACHE_VERSION: &str = "1.0.0";

/// Short retry policy so failure paths finish quickly against real sockets
pub const FAST_POLICY: RetryPolicy = RetryPolicy {
    max_attempts: 2,
    per_attempt_timeout: Duration::from_millis(300),
    inter_attempt_delay: Duration::from_millis(100),
};

pub fn test_config(legacy_url: &str, primary_url: Option<&str>) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        legacy_api_url: legacy_url.to_string(),
        primary_api_url: primary_url.map(str::to_string),
        primary_api_key: primary_url.map(|_| TEST_PRIMARY_API_KEY.to_string()),
        redis_url: None,
        cache_version: TEST_CACHE_VERSION.to_string(),
        catalog_fresh_ttl_seconds: 900,
        catalog_stale_ttl_seconds: 3600,
        lookup_ttl_seconds: 300,
        catalog_timeout_seconds: 15,
        lookup_timeout_seconds: 10,
        retry_delay_ms: 1000,
        max_attempts: 2,
        visit_marker_max_age_hours: 24,
    }
}

/// Storefront plus the handles tests need to steer it
pub struct TestHarness {
    pub legacy: MockLegacyServer,
    pub primary: Option<MockPrimaryServer>,
    pub config: Config,
    pub clock: Arc<ManualClock>,
    pub markers: Arc<InMemoryMarkerStore>,
    pub storefront: Arc<Storefront>,
}

impl TestHarness {
    /// Legacy backend only, markers already current
    pub async fn legacy_only() -> Self {
        Self::build(false, current_markers()).await
    }

    /// Both backends, markers already current
    pub async fn with_primary() -> Self {
        Self::build(true, current_markers()).await
    }

    /// Legacy backend only, no markers (first visit)
    pub async fn new_client() -> Self {
        Self::build(false, InMemoryMarkerStore::new()).await
    }

    async fn build(with_primary: bool, markers: InMemoryMarkerStore) -> Self {
        let legacy = MockLegacyServer::start().await;
        let primary = if with_primary {
            Some(MockPrimaryServer::start().await)
        } else {
            None
        };

        let config = test_config(&legacy.url(), primary.as_ref().map(|p| p.uri()).as_deref());
        let clock = Arc::new(ManualClock::new());
        let markers = Arc::new(markers);
        let storefront = Arc::new(build_storefront(&config, clock.clone(), markers.clone()));

        Self {
            legacy,
            primary,
            config,
            clock,
            markers,
            storefront,
        }
    }

    pub fn primary(&self) -> &MockPrimaryServer {
        self.primary.as_ref().expect("harness built without primary backend")
    }

    pub fn server(&self) -> TestServer {
        let state = Arc::new(AppState::new_for_testing(
            self.config.clone(),
            self.storefront.clone(),
            self.markers.clone(),
        ));
        TestServer::new(create_router(state)).expect("Failed to create test server")
    }
}

fn current_markers() -> InMemoryMarkerStore {
    InMemoryMarkerStore::with_markers(Utc::now(), TEST_CACHE_VERSION)
}

pub fn build_storefront(
    config: &Config,
    clock: Arc<ManualClock>,
    markers: Arc<InMemoryMarkerStore>,
) -> Storefront {
    let http = reqwest::Client::new();
    let legacy = Arc::new(LegacyClient::new(http.clone(), config));
    let primary = PostgrestClient::from_config(http, config)
        .map(|client| Arc::new(client) as Arc<dyn PrimaryBackend>);
    let chain = Arc::new(FallbackChain::new(primary, legacy, FAST_POLICY, FAST_POLICY));

    Storefront::new(chain, markers, clock, StorefrontOptions::from_config(config))
}

pub const MIN: Duration = Duration::from_secs(60);
