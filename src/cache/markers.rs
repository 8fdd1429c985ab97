//! Durable version markers
//!
//! Two small markers survive restarts: when this client was last seen and
//! which cache version it last ran. A missing or outdated marker forces a
//! one-time invalidation of every registered cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use super::Invalidate;
use crate::error::AppResult;

/// Marker keys
pub mod keys {
    pub const LAST_VISIT: &str = "vitrine:markers:last_visit";
    pub const CACHE_VERSION: &str = "vitrine:markers:cache_version";
}

/// Durable string storage for the markers
#[async_trait]
pub trait MarkerStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Connectivity check for readiness probes
    async fn ping(&self) -> AppResult<()>;
}

/// Redis-backed marker store
pub struct RedisMarkerStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisMarkerStore {
    pub fn new(conn: redis::aio::ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl MarkerStore for RedisMarkerStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}

/// Process-local marker store
///
/// Used when no Redis URL is configured, and in tests.
#[derive(Default)]
pub struct InMemoryMarkerStore {
    data: RwLock<HashMap<String, String>>,
}

impl InMemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with both markers
    pub fn with_markers(last_visit: DateTime<Utc>, version: &str) -> Self {
        let store = Self::new();
        {
            let mut data = store.data.write().unwrap();
            data.insert(keys::LAST_VISIT.to_string(), last_visit.to_rfc3339());
            data.insert(keys::CACHE_VERSION.to_string(), version.to_string());
        }
        store
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.data.read().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl MarkerStore for InMemoryMarkerStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.data
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Outcome of comparing the markers with the running version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerCheck {
    /// Markers present and current
    Current,
    /// No last-visit marker
    NewClient,
    /// Last run used a different (or no) cache version
    VersionChanged { seen: Option<String> },
    /// Last visit older than the allowed age, or unreadable
    VisitExpired,
    /// Marker store could not be read; nothing was invalidated
    StoreUnavailable,
}

impl MarkerCheck {
    pub fn requires_invalidation(&self) -> bool {
        matches!(
            self,
            MarkerCheck::NewClient | MarkerCheck::VersionChanged { .. } | MarkerCheck::VisitExpired
        )
    }
}

/// Pure marker comparison
pub fn evaluate_markers(
    last_visit: Option<&str>,
    seen_version: Option<&str>,
    current_version: &str,
    now: DateTime<Utc>,
    max_visit_age: chrono::Duration,
) -> MarkerCheck {
    let Some(last_visit) = last_visit else {
        return MarkerCheck::NewClient;
    };
    if seen_version != Some(current_version) {
        return MarkerCheck::VersionChanged {
            seen: seen_version.map(str::to_string),
        };
    }

    match DateTime::parse_from_rfc3339(last_visit) {
        Ok(at) if now.signed_duration_since(at.with_timezone(&Utc)) <= max_visit_age => {
            MarkerCheck::Current
        }
        _ => MarkerCheck::VisitExpired,
    }
}

/// Runs the marker check once per process and invalidates on demand
pub struct VersionGuard {
    store: Arc<dyn MarkerStore>,
    version: String,
    max_visit_age: chrono::Duration,
    targets: Vec<Arc<dyn Invalidate>>,
    checked: OnceCell<MarkerCheck>,
}

impl VersionGuard {
    pub fn new(
        store: Arc<dyn MarkerStore>,
        version: impl Into<String>,
        max_visit_age: chrono::Duration,
        targets: Vec<Arc<dyn Invalidate>>,
    ) -> Self {
        Self {
            store,
            version: version.into(),
            max_visit_age,
            targets,
            checked: OnceCell::new(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn store(&self) -> &Arc<dyn MarkerStore> {
        &self.store
    }

    /// Result of the one-time check, running it on first use
    pub async fn ensure_checked(&self) -> &MarkerCheck {
        self.checked.get_or_init(|| self.run_check()).await
    }

    #[instrument(skip(self), fields(version = %self.version))]
    async fn run_check(&self) -> MarkerCheck {
        let now = Utc::now();

        let markers = async {
            let last_visit = self.store.get(keys::LAST_VISIT).await?;
            let seen_version = self.store.get(keys::CACHE_VERSION).await?;
            Ok::<_, crate::error::AppError>((last_visit, seen_version))
        }
        .await;

        let check = match markers {
            Ok((last_visit, seen_version)) => evaluate_markers(
                last_visit.as_deref(),
                seen_version.as_deref(),
                &self.version,
                now,
                self.max_visit_age,
            ),
            Err(e) => {
                warn!(error = %e, "Marker store unavailable, skipping version check");
                return MarkerCheck::StoreUnavailable;
            }
        };

        if check.requires_invalidation() {
            let cleared: usize = self.targets.iter().map(|t| t.invalidate_all()).sum();
            info!(reason = ?check, cleared, "Cache markers outdated, invalidated all caches");
            crate::metrics::record_invalidation("markers");

            if let Err(e) = self.store.set(keys::CACHE_VERSION, &self.version).await {
                warn!(error = %e, "Failed to write cache version marker");
            }
        } else {
            debug!("Cache markers current");
        }

        if let Err(e) = self.store.set(keys::LAST_VISIT, &now.to_rfc3339()).await {
            warn!(error = %e, "Failed to write last visit marker");
        }

        check
    }
}
