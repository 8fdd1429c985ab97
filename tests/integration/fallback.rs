//! Backend fallback integration tests
//!
//! Primary first, legacy with retries, emergency stale serve, hard failure
//! and timeout escalation.

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::json;
use vitrine::{CacheStatus, FetchError};

use crate::common::{TestHarness, FAST_POLICY, MIN};
use crate::mocks::LegacyTestData;

#[tokio::test]
async fn test_primary_backend_serves_when_healthy() {
    let h = TestHarness::with_primary().await;
    h.primary().mock_catalog_tables().await;

    let catalog = h.storefront.catalog().await.unwrap();

    assert_eq!(catalog.products[0].name, "Açaí 500ml (primary)");
    assert_eq!(catalog.products[0].estoque, 4);
    assert_eq!(h.legacy.calls_for("getCatalogData").await, 0);
}

#[tokio::test]
async fn test_primary_failure_falls_through_to_legacy() {
    let h = TestHarness::with_primary().await;
    h.primary().mock_unavailable().await;
    h.legacy.mock_catalog(LegacyTestData::catalog()).await;

    let catalog = h.storefront.catalog().await.unwrap();

    assert_eq!(catalog.products[0].name, "Açaí 500ml");
    assert_eq!(h.legacy.calls_for("getCatalogData").await, 1);
    assert!(!h.primary().received_requests().await.is_empty());
}

#[tokio::test]
async fn test_malformed_payload_is_retried() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_catalog_times(json!({ "success": true }), 1).await;
    h.legacy.mock_catalog(LegacyTestData::catalog()).await;

    let catalog = h.storefront.catalog().await.unwrap();

    assert_eq!(catalog.products.len(), 2);
    assert_eq!(h.legacy.calls_for("getCatalogData").await, 2);
}

#[tokio::test]
async fn test_backend_failure_flag_propagates_without_cache() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_catalog(LegacyTestData::failure("planilha indisponível")).await;

    let err = h.storefront.catalog().await.unwrap_err();

    assert_eq!(err, FetchError::Backend("planilha indisponível".to_string()));
    assert_eq!(h.legacy.calls_for("getCatalogData").await, 2);
}

#[tokio::test]
async fn test_expired_entry_served_when_both_backends_fail() {
    let h = TestHarness::with_primary().await;
    h.primary().mock_unavailable().await;
    h.legacy.mock_catalog_times(LegacyTestData::catalog(), 1).await;

    let original = h.storefront.catalog().await.unwrap();
    h.clock.advance(3 * 60 * MIN);

    let served = h.storefront.catalog_served().await.unwrap();

    assert_eq!(served.status, CacheStatus::Emergency);
    assert_eq!(served.data, original);
    // one initial fetch plus two exhausted attempts
    assert_eq!(h.legacy.calls_for("getCatalogData").await, 3);
}

#[tokio::test]
async fn test_hard_failure_without_cache() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_catalog_status(503).await;

    let err = h.storefront.catalog().await.unwrap_err();

    assert_eq!(err.kind(), "network");
    assert_eq!(h.legacy.calls_for("getCatalogData").await, 2);

    // failures are not cached; the next call goes back to the network
    let _ = h.storefront.catalog().await;
    assert_eq!(h.legacy.calls_for("getCatalogData").await, 4);
}

#[tokio::test]
async fn test_timeout_on_both_attempts_rejects() {
    let h = TestHarness::legacy_only().await;
    h.legacy
        .mock_catalog_delayed(LegacyTestData::catalog(), Duration::from_secs(3))
        .await;

    let start = Instant::now();
    let err = h.storefront.catalog().await.unwrap_err();
    let elapsed = start.elapsed();

    assert_eq!(err, FetchError::Timeout(FAST_POLICY.per_attempt_timeout));
    assert_eq!(h.legacy.calls_for("getCatalogData").await, 2);

    let minimum = FAST_POLICY.per_attempt_timeout * 2 + FAST_POLICY.inter_attempt_delay;
    assert!(elapsed >= minimum, "finished too early: {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "attempts were not bounded: {:?}", elapsed);
}
