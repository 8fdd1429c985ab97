//! Secondary lookup caches
//!
//! Small fresh-only caches for coupon, referral and product-additions
//! lookups. Only successful outcomes are ever stored: an invalid coupon or
//! unknown product is re-queried on the next call. Concurrent misses for
//! one key share a single load.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

use super::Invalidate;
use crate::clock::Clock;
use crate::inflight::Inflight;
use crate::metrics;
use crate::models::{CouponResult, ProductAdditions, ReferralResult};

/// Lookup results that can tell success from failure
pub trait LookupOutcome {
    fn is_success(&self) -> bool;
}

impl LookupOutcome for CouponResult {
    fn is_success(&self) -> bool {
        self.valid
    }
}

impl LookupOutcome for ReferralResult {
    fn is_success(&self) -> bool {
        self.valid
    }
}

impl LookupOutcome for ProductAdditions {
    fn is_success(&self) -> bool {
        self.found
    }
}

struct LookupEntry<T> {
    value: T,
    stored_at: Instant,
}

/// Fresh-only cache keyed by a normalized key
pub struct LookupCache<T> {
    name: &'static str,
    entries: RwLock<HashMap<String, LookupEntry<T>>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    normalize_key: fn(&str) -> String,
    loading: Inflight<T>,
}

impl<T: LookupOutcome + Clone + Send + Sync + 'static> LookupCache<T> {
    pub fn new(
        name: &'static str,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        normalize_key: fn(&str) -> String,
    ) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
            clock,
            ttl,
            normalize_key,
            loading: Inflight::default(),
        }
    }

    /// The key `raw` is stored under
    pub fn key(&self, raw: &str) -> String {
        (self.normalize_key)(raw)
    }

    /// Fresh cached value, if any
    pub fn get(&self, raw_key: &str) -> Option<T> {
        let key = self.key(raw_key);
        let now = self.clock.now();
        let entries = self.entries.read().unwrap();

        match entries.get(&key) {
            Some(entry) if now.saturating_duration_since(entry.stored_at) < self.ttl => {
                debug!(cache = self.name, key = %key, "Lookup cache hit");
                Some(entry.value.clone())
            }
            _ => None,
        }
    }

    /// Stores `value` if it is a success; returns whether it was stored
    ///
    /// Expired entries are swept on every store, so the map never holds
    /// more than one TTL window of distinct keys.
    pub fn store(&self, raw_key: &str, value: &T) -> bool {
        if !value.is_success() {
            debug!(cache = self.name, key = %raw_key, "Not caching unsuccessful lookup");
            return false;
        }

        let key = self.key(raw_key);
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap();
        entries.retain(|_, entry| now.saturating_duration_since(entry.stored_at) < self.ttl);
        entries.insert(
            key,
            LookupEntry {
                value: value.clone(),
                stored_at: now,
            },
        );
        true
    }

    /// Cached value for `raw_key`, or the outcome of one shared load
    ///
    /// `load` receives the normalized key. Only successful outcomes are
    /// stored. Returns `None` if the load task panicked or was cancelled.
    pub async fn get_or_load<F, Fut>(self: &Arc<Self>, raw_key: &str, load: F) -> Option<T>
    where
        T: 'static,
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        if let Some(cached) = self.get(raw_key) {
            metrics::record_cache_operation(self.name, "hit");
            return Some(cached);
        }

        let key = self.key(raw_key);
        let cache = self.clone();
        let (pending, joined) = self.loading.join_or_spawn(&key, || {
            let work = load(key.clone());
            let key = key.clone();
            async move {
                let value = work.await;
                cache.store(&key, &value);
                value
            }
        });

        if joined {
            debug!(cache = self.name, key = %key, "Joining in-flight lookup");
        }
        metrics::record_cache_operation(self.name, if joined { "joined" } else { "miss" });
        pending.await
    }

    /// Whether a load for `raw_key` is currently running
    pub fn is_loading(&self, raw_key: &str) -> bool {
        self.loading.contains(&self.key(raw_key))
    }

    pub fn invalidate(&self, raw_key: &str) -> bool {
        let key = self.key(raw_key);
        self.entries.write().unwrap().remove(&key).is_some()
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write().unwrap();
        let count = entries.len();
        entries.clear();
        debug!(cache = self.name, count, "Cleared lookup cache");
        count
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: LookupOutcome + Clone + Send + Sync + 'static> Invalidate for LookupCache<T> {
    fn name(&self) -> &str {
        self.name
    }

    fn invalidate_all(&self) -> usize {
        self.clear()
    }
}

/// Key normalization for product ids
pub fn normalize_product_id(id: &str) -> String {
    id.trim().to_string()
}
