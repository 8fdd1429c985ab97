//! Catalog integration tests
//!
//! Tiered caching of the catalog against a wiremock legacy endpoint:
//! miss then fresh, request coalescing, stale-while-revalidate.

use pretty_assertions::assert_eq;
use vitrine::{revalidator::RevalidationOutcome, CacheStatus};

use crate::common::{TestHarness, MIN};
use crate::mocks::LegacyTestData;

#[tokio::test]
async fn test_first_fetch_misses_then_serves_fresh() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_catalog(LegacyTestData::catalog()).await;

    let first = h.storefront.catalog_served().await.unwrap();
    assert_eq!(first.status, CacheStatus::Miss);

    let catalog = &first.data;
    assert_eq!(catalog.products.len(), 2);
    assert_eq!(catalog.products[0].price, 18.5);
    assert_eq!(catalog.products[0].estoque, 12);
    assert!(catalog.products[0].has_additions);
    assert_eq!(catalog.categories[0].name, "Açaí");
    assert_eq!(catalog.banners.len(), 1);

    h.clock.advance(10 * MIN);
    let second = h.storefront.catalog_served().await.unwrap();
    assert_eq!(second.status, CacheStatus::Fresh);
    assert_eq!(second.data, first.data);

    assert_eq!(h.legacy.calls_for("getCatalogData").await, 1);
}

#[tokio::test]
async fn test_concurrent_fetches_issue_one_request() {
    let h = TestHarness::legacy_only().await;
    h.legacy
        .mock_catalog_delayed(LegacyTestData::catalog(), std::time::Duration::from_millis(150))
        .await;

    let (a, b, c) = tokio::join!(
        h.storefront.catalog(),
        h.storefront.catalog(),
        h.storefront.catalog()
    );

    assert_eq!(a.unwrap(), b.clone().unwrap());
    assert_eq!(b.unwrap(), c.unwrap());
    assert_eq!(h.legacy.calls_for("getCatalogData").await, 1);
    assert!(!h.storefront.catalog_in_flight());
}

#[tokio::test]
async fn test_stale_reads_revalidate_once_in_background() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_catalog_times(LegacyTestData::catalog(), 1).await;
    h.legacy.mock_catalog(LegacyTestData::catalog_v2()).await;

    h.storefront.catalog().await.unwrap();
    h.clock.advance(20 * MIN);

    let mut outcomes = h.storefront.subscribe_revalidations();
    for _ in 0..3 {
        let served = h.storefront.catalog_served().await.unwrap();
        assert_eq!(served.status, CacheStatus::Stale);
        assert_eq!(served.data.products[0].name, "Açaí 500ml");
    }

    let outcome = outcomes.recv().await.unwrap();
    assert_eq!(outcome, RevalidationOutcome::Refreshed { key: "catalog".to_string() });
    assert_eq!(h.legacy.calls_for("getCatalogData").await, 2);

    let served = h.storefront.catalog_served().await.unwrap();
    assert_eq!(served.status, CacheStatus::Fresh);
    assert_eq!(served.data.products[0].name, "Açaí 700ml");
}

#[tokio::test]
async fn test_failed_revalidation_keeps_serving_stale_data() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_catalog_times(LegacyTestData::catalog(), 1).await;

    h.storefront.catalog().await.unwrap();
    h.clock.advance(30 * MIN);

    let mut outcomes = h.storefront.subscribe_revalidations();
    let served = h.storefront.catalog_served().await.unwrap();
    assert_eq!(served.status, CacheStatus::Stale);

    assert!(matches!(
        outcomes.recv().await.unwrap(),
        RevalidationOutcome::Failed { .. }
    ));

    let served = h.storefront.catalog_served().await.unwrap();
    assert_eq!(served.status, CacheStatus::Stale);
    assert_eq!(served.data.products[0].id, "P001");
}

#[tokio::test]
async fn test_product_queries_reuse_the_catalog() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_catalog(LegacyTestData::catalog()).await;

    let product = h.storefront.product("P002").await.unwrap().unwrap();
    assert_eq!(product.name, "Suco de Laranja");
    assert!(h.storefront.product("P999").await.unwrap().is_none());

    let drinks = h.storefront.products_in_category("BEBIDAS").await.unwrap();
    assert_eq!(drinks.len(), 1);

    assert_eq!(h.legacy.calls_for("getCatalogData").await, 1);
}

#[tokio::test]
async fn test_invalidate_catalog_forces_refetch() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_catalog(LegacyTestData::catalog()).await;

    h.storefront.catalog().await.unwrap();
    assert!(h.storefront.invalidate_catalog());

    let served = h.storefront.catalog_served().await.unwrap();
    assert_eq!(served.status, CacheStatus::Miss);
    assert_eq!(h.legacy.calls_for("getCatalogData").await, 2);
}
