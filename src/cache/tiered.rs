//! Tiered cache store
//!
//! Entries are classified FRESH / STALE / COLD from their age and the
//! version they were stored under. `classify` is the single source of truth
//! for that table; nothing else compares timestamps.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

use super::Invalidate;
use crate::clock::Clock;

/// Classification of a cache lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Cold,
}

/// Age limits for each tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    /// Entries younger than this are served without a refresh
    pub fresh: Duration,
    /// Entries younger than this are still served, with a background refresh
    pub stale: Duration,
}

impl TtlPolicy {
    pub const CATALOG: TtlPolicy = TtlPolicy {
        fresh: Duration::from_secs(15 * 60),
        stale: Duration::from_secs(60 * 60),
    };

    /// Fresh and stale tiers; a stale limit below the fresh limit is raised to it
    pub fn tiered(fresh: Duration, stale: Duration) -> Self {
        Self {
            fresh,
            stale: stale.max(fresh),
        }
    }

    /// No stale tier: entries go straight from fresh to cold
    pub fn fresh_only(ttl: Duration) -> Self {
        Self {
            fresh: ttl,
            stale: ttl,
        }
    }
}

/// A stored value with the time and version it was stored under
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub data: T,
    pub stored_at: Instant,
    pub version: String,
}

impl<T> CacheEntry<T> {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }
}

/// Classifies an entry against the current time and version
pub fn classify<T>(
    entry: Option<&CacheEntry<T>>,
    now: Instant,
    current_version: &str,
    ttl: &TtlPolicy,
) -> Freshness {
    let Some(entry) = entry else {
        return Freshness::Cold;
    };
    if entry.version != current_version {
        return Freshness::Cold;
    }

    let age = entry.age(now);
    if age < ttl.fresh {
        Freshness::Fresh
    } else if age < ttl.stale {
        Freshness::Stale
    } else {
        Freshness::Cold
    }
}

/// Result of `TieredCache::get`
///
/// A COLD lookup never carries an entry; use `TieredCache::peek` to reach
/// data past its stale limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<T> {
    pub freshness: Freshness,
    pub entry: Option<CacheEntry<T>>,
}

/// Keyed store of versioned, timestamped entries
pub struct TieredCache<T> {
    name: &'static str,
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    clock: Arc<dyn Clock>,
    ttl: TtlPolicy,
    version: RwLock<String>,
}

impl<T: Clone + Send + Sync> TieredCache<T> {
    pub fn new(
        name: &'static str,
        clock: Arc<dyn Clock>,
        ttl: TtlPolicy,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
            clock,
            ttl,
            version: RwLock::new(version.into()),
        }
    }

    pub fn ttl(&self) -> TtlPolicy {
        self.ttl
    }

    pub fn current_version(&self) -> String {
        self.version.read().unwrap().clone()
    }

    /// Change the version token; entries stored under other versions turn COLD
    pub fn set_current_version(&self, version: impl Into<String>) {
        *self.version.write().unwrap() = version.into();
    }

    /// Look up and classify
    pub fn get(&self, key: &str) -> Lookup<T> {
        let entries = self.entries.read().unwrap();
        let entry = entries.get(key);
        let version = self.version.read().unwrap();
        let freshness = classify(entry, self.clock.now(), &version, &self.ttl);

        match freshness {
            Freshness::Cold => Lookup {
                freshness,
                entry: None,
            },
            _ => Lookup {
                freshness,
                entry: entry.cloned(),
            },
        }
    }

    /// Raw entry regardless of age or version
    pub fn peek(&self, key: &str) -> Option<CacheEntry<T>> {
        self.entries.read().unwrap().get(key).cloned()
    }

    /// Replace the entry for `key`, stamped now under the current version
    pub fn set(&self, key: &str, data: T) {
        let version = self.current_version();
        self.set_with_version(key, data, version);
    }

    pub fn set_with_version(&self, key: &str, data: T, version: impl Into<String>) {
        let entry = CacheEntry {
            data,
            stored_at: self.clock.now(),
            version: version.into(),
        };
        debug!(cache = self.name, key = %key, version = %entry.version, "Storing cache entry");
        self.entries.write().unwrap().insert(key.to_string(), entry);
    }

    /// Drop one entry; returns whether it existed
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.entries.write().unwrap().remove(key).is_some();
        debug!(cache = self.name, key = %key, removed, "Invalidated cache entry");
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Invalidate for TieredCache<T> {
    fn name(&self) -> &str {
        self.name
    }

    fn invalidate_all(&self) -> usize {
        let mut entries = self.entries.write().unwrap();
        let count = entries.len();
        entries.clear();
        debug!(cache = self.name, count, "Invalidated all cache entries");
        count
    }
}
