//! Fetch coordinator
//!
//! Entry point for tiered resources. Concurrent fetches of one key share a
//! single cycle: cache lookup, then (on COLD) one load through the backend
//! chain. Every waiter sees the same value or the same error, and the slot
//! is released as soon as the cycle finishes. Cycles run as spawned tasks,
//! so a fetch completes and fills the cache even if every caller gives up.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use crate::cache::{Freshness, Invalidate, TieredCache, VersionGuard};
use crate::error::{FetchError, FetchResult};
use crate::inflight::Inflight;
use crate::metrics;
use crate::revalidator::{BackgroundRevalidator, RevalidationOutcome};

/// Produces a fresh value for a key, normally through the fallback chain
#[async_trait]
pub trait ResourceLoader<T>: Send + Sync {
    async fn load(&self, key: &str) -> FetchResult<T>;
}

/// How a served value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Fresh,
    Stale,
    Miss,
    /// Backends failed; an expired entry was served instead
    Emergency,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Fresh => "fresh",
            CacheStatus::Stale => "stale",
            CacheStatus::Miss => "miss",
            CacheStatus::Emergency => "emergency",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    pub data: T,
    pub status: CacheStatus,
}

pub struct FetchCoordinator<T> {
    cache: Arc<TieredCache<T>>,
    loader: Arc<dyn ResourceLoader<T>>,
    revalidator: BackgroundRevalidator<T>,
    inflight: Inflight<FetchResult<Served<T>>>,
    guard: Option<Arc<VersionGuard>>,
}

impl<T> Clone for FetchCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            loader: self.loader.clone(),
            revalidator: self.revalidator.clone(),
            inflight: self.inflight.clone(),
            guard: self.guard.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> FetchCoordinator<T> {
    pub fn new(cache: Arc<TieredCache<T>>, loader: Arc<dyn ResourceLoader<T>>) -> Self {
        let revalidator = BackgroundRevalidator::new(cache.clone(), loader.clone());
        Self {
            cache,
            loader,
            revalidator,
            inflight: Inflight::new(),
            guard: None,
        }
    }

    /// Run the durable marker check before the first cache lookup
    pub fn with_version_guard(mut self, guard: Arc<VersionGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn cache(&self) -> &Arc<TieredCache<T>> {
        &self.cache
    }

    pub fn subscribe_revalidations(&self) -> broadcast::Receiver<RevalidationOutcome> {
        self.revalidator.subscribe()
    }

    /// Whether a fetch cycle for `key` is currently unresolved
    pub fn in_flight(&self, key: &str) -> bool {
        self.inflight.contains(key)
    }

    pub async fn fetch_resource(&self, key: &str) -> FetchResult<T> {
        self.fetch_served(key).await.map(|served| served.data)
    }

    /// Fetch with the cache status attached
    pub async fn fetch_served(&self, key: &str) -> FetchResult<Served<T>> {
        let this = self.clone();
        let owned_key = key.to_string();
        let (pending, joined) = self
            .inflight
            .join_or_spawn(key, move || this.run_cycle(owned_key));
        if joined {
            debug!(cache = self.cache.name(), key = %key, "Joining in-flight fetch");
        }

        pending
            .await
            .unwrap_or_else(|| Err(FetchError::Internal("fetch cycle did not complete".into())))
    }

    #[instrument(skip(self), fields(cache = self.cache.name()))]
    async fn run_cycle(self, key: String) -> FetchResult<Served<T>> {
        if let Some(guard) = &self.guard {
            guard.ensure_checked().await;
        }

        let resource = self.cache.name().to_string();
        let lookup = self.cache.get(&key);

        match (lookup.freshness, lookup.entry) {
            (Freshness::Fresh, Some(entry)) => {
                debug!(key = %key, "Cache fresh");
                metrics::record_cache_operation(&resource, "fresh");
                return Ok(Served {
                    data: entry.data,
                    status: CacheStatus::Fresh,
                });
            }
            (Freshness::Stale, Some(entry)) => {
                debug!(key = %key, "Cache stale, serving and revalidating");
                metrics::record_cache_operation(&resource, "stale");
                self.revalidator.schedule(&key);
                return Ok(Served {
                    data: entry.data,
                    status: CacheStatus::Stale,
                });
            }
            _ => {}
        }

        // a refresh started by an earlier STALE read may still be running;
        // joining it keeps the key at one load at a time
        let loaded = match self.revalidator.running(&key) {
            Some(refresh) => {
                debug!(key = %key, "Cache cold, joining running revalidation");
                refresh.await.unwrap_or_else(|| {
                    Err(FetchError::Internal("revalidation task did not complete".into()))
                })
            }
            None => {
                debug!(key = %key, "Cache cold, loading");
                self.loader.load(&key).await
            }
        };

        match loaded {
            Ok(data) => {
                metrics::record_cache_operation(&resource, "miss");
                self.cache.set(&key, data.clone());
                Ok(Served {
                    data,
                    status: CacheStatus::Miss,
                })
            }
            Err(error) => match self.cache.peek(&key) {
                Some(entry) => {
                    warn!(
                        key = %key,
                        error = %error,
                        stored_version = %entry.version,
                        "Backends failed, serving expired entry"
                    );
                    metrics::record_cache_operation(&resource, "emergency");
                    Ok(Served {
                        data: entry.data,
                        status: CacheStatus::Emergency,
                    })
                }
                None => {
                    metrics::record_cache_operation(&resource, "error");
                    Err(error)
                }
            },
        }
    }
}
