//! Background revalidation
//!
//! A STALE read schedules a refresh that nobody awaits. Refreshes run as
//! per-key in-flight tasks, so a burst of stale reads leaves one refresh
//! outstanding and a COLD fetch arriving mid-refresh can join it instead of
//! loading again. Outcomes are published on a broadcast channel instead of
//! being silently dropped.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cache::TieredCache;
use crate::coordinator::ResourceLoader;
use crate::error::{FetchError, FetchResult};
use crate::inflight::{Inflight, Pending};

/// Capacity of the outcome channel; slow subscribers see `Lagged`
const OUTCOME_CHANNEL_CAPACITY: usize = 64;

/// Result of one background refresh
#[derive(Debug, Clone, PartialEq)]
pub enum RevalidationOutcome {
    Refreshed { key: String },
    Failed { key: String, error: FetchError },
}

impl RevalidationOutcome {
    pub fn key(&self) -> &str {
        match self {
            RevalidationOutcome::Refreshed { key } | RevalidationOutcome::Failed { key, .. } => key,
        }
    }
}

pub struct BackgroundRevalidator<T> {
    cache: Arc<TieredCache<T>>,
    loader: Arc<dyn ResourceLoader<T>>,
    refreshing: Inflight<FetchResult<T>>,
    outcomes: broadcast::Sender<RevalidationOutcome>,
}

impl<T> Clone for BackgroundRevalidator<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            loader: self.loader.clone(),
            refreshing: self.refreshing.clone(),
            outcomes: self.outcomes.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> BackgroundRevalidator<T> {
    pub fn new(cache: Arc<TieredCache<T>>, loader: Arc<dyn ResourceLoader<T>>) -> Self {
        let (outcomes, _) = broadcast::channel(OUTCOME_CHANNEL_CAPACITY);
        Self {
            cache,
            loader,
            refreshing: Inflight::new(),
            outcomes,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RevalidationOutcome> {
        self.outcomes.subscribe()
    }

    pub fn is_busy(&self, key: &str) -> bool {
        self.refreshing.contains(key)
    }

    /// The refresh currently running for `key`, if any
    pub fn running(&self, key: &str) -> Option<Pending<FetchResult<T>>> {
        self.refreshing.get(key)
    }

    /// Start a refresh of `key` unless one is already running
    ///
    /// Returns whether a new refresh was spawned.
    pub fn schedule(&self, key: &str) -> bool {
        let this = self.clone();
        let owned_key = key.to_string();
        let (pending, joined) = self
            .refreshing
            .join_or_spawn(key, move || async move { this.refresh(owned_key).await });

        if joined {
            debug!(key = %key, "Revalidation already in progress");
            return false;
        }

        // the key is released before `pending` resolves, so subscribers
        // never see an outcome while the key still reads as busy
        let outcomes = self.outcomes.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            let outcome = match pending.await {
                Some(Ok(_)) => RevalidationOutcome::Refreshed { key },
                Some(Err(error)) => RevalidationOutcome::Failed { key, error },
                None => RevalidationOutcome::Failed {
                    key,
                    error: FetchError::Internal("revalidation task did not complete".into()),
                },
            };
            // no subscribers is fine
            let _ = outcomes.send(outcome);
        });
        true
    }

    async fn refresh(&self, key: String) -> FetchResult<T> {
        debug!(key = %key, "Revalidating stale entry");

        let result = self.loader.load(&key).await;
        match &result {
            Ok(data) => {
                self.cache.set(&key, data.clone());
                info!(key = %key, "Revalidated cache entry");
                crate::metrics::record_revalidation("refreshed");
            }
            Err(error) => {
                warn!(key = %key, error = %error, "Background revalidation failed, keeping stale data");
                crate::metrics::record_revalidation("failed");
            }
        }
        result
    }
}
