//! Durable marker integration tests

use pretty_assertions::assert_eq;
use vitrine::cache::{markers::keys, MarkerCheck};

use crate::common::{TestHarness, TEST_CACHE_VERSION};
use crate::mocks::LegacyTestData;

#[tokio::test]
async fn test_first_visit_writes_markers() {
    let h = TestHarness::new_client().await;
    h.legacy.mock_catalog(LegacyTestData::catalog()).await;

    h.storefront.catalog().await.unwrap();

    assert_eq!(h.storefront.check_markers().await, MarkerCheck::NewClient);
    assert_eq!(
        h.markers.value(keys::CACHE_VERSION).as_deref(),
        Some(TEST_CACHE_VERSION)
    );
    let last_visit = h.markers.value(keys::LAST_VISIT).unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(&last_visit).is_ok());
}

#[tokio::test]
async fn test_returning_client_is_current() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_catalog(LegacyTestData::catalog()).await;

    h.storefront.catalog().await.unwrap();

    assert_eq!(h.storefront.check_markers().await, MarkerCheck::Current);
}
