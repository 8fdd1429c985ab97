//! Vitrine - storefront data-access layer
//!
//! Serves catalog, coupon, product-additions and referral data to a
//! storefront UI in front of two unreliable backends: an optional fast
//! structured backend and a slow legacy action endpoint. Requests are
//! coalesced, cached in fresh/stale/cold tiers with background
//! revalidation, and fall back to expired data when both backends fail.

pub mod backend;
pub mod cache;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod inflight;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod revalidator;
pub mod routes;
pub mod storefront;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::info;

pub use crate::cache::{InMemoryMarkerStore, MarkerStore, RedisMarkerStore};
pub use crate::config::Config;
pub use crate::coordinator::{CacheStatus, FetchCoordinator, Served};
pub use crate::error::{FetchError, FetchResult};
pub use crate::storefront::{Storefront, StorefrontOptions};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    pub storefront: Arc<Storefront>,
    /// Durable marker store, also pinged by the readiness probe
    pub markers: Arc<dyn MarkerStore>,
}

impl AppState {
    /// Create a new application state
    pub async fn new(config: Config) -> Result<Self> {
        let markers: Arc<dyn MarkerStore> = match &config.redis_url {
            Some(url) => {
                let client = redis::Client::open(url.as_str())?;
                let conn = redis::aio::ConnectionManager::new(client).await?;
                info!("Using Redis marker store");
                Arc::new(RedisMarkerStore::new(conn))
            }
            None => {
                info!("REDIS_URL not set, version markers live in memory");
                Arc::new(InMemoryMarkerStore::new())
            }
        };

        // Per-attempt timeouts are enforced by the retry policy; this is a backstop
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(16)
            .timeout(Duration::from_secs(60))
            .build()?;

        let storefront = Arc::new(Storefront::from_config(
            &config,
            http_client,
            markers.clone(),
        )?);

        Ok(Self {
            config,
            start_time: Instant::now(),
            storefront,
            markers,
        })
    }

    /// Create an application state around a pre-built storefront
    ///
    /// Lets tests point the storefront at wiremock servers and use a manual
    /// clock and an in-memory marker store.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(
        config: Config,
        storefront: Arc<Storefront>,
        markers: Arc<dyn MarkerStore>,
    ) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            storefront,
            markers,
        }
    }
}
