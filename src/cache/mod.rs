//! Cache module
//!
//! In-process tiered and lookup caches, plus the durable markers that
//! decide when everything must be thrown away.

pub mod lookup;
pub mod markers;
pub mod tiered;

pub use self::lookup::{normalize_product_id, LookupCache, LookupOutcome};
pub use self::markers::{
    InMemoryMarkerStore, MarkerCheck, MarkerStore, RedisMarkerStore, VersionGuard,
};
pub use self::tiered::{classify, CacheEntry, Freshness, Lookup, TieredCache, TtlPolicy};

/// A cache that can be emptied wholesale
pub trait Invalidate: Send + Sync {
    fn name(&self) -> &str;

    /// Drop every entry; returns how many were removed
    fn invalidate_all(&self) -> usize;
}
