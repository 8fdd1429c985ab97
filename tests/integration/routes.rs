//! HTTP surface integration tests
//!
//! Drives the axum router through axum-test with wiremock backends.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use vitrine::routes::cache_admin::{CacheScope, InvalidateResponse};

use crate::common::TestHarness;
use crate::mocks::LegacyTestData;

#[tokio::test]
async fn test_catalog_reports_cache_status() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_catalog(LegacyTestData::catalog()).await;
    let server = h.server();

    let response = server.get("/v1/catalog").await;
    response.assert_status_ok();
    assert_eq!(response.header("x-cache-status"), "miss");

    let body: Value = response.json();
    assert_eq!(body["products"][0]["id"], "P001");
    assert_eq!(body["products"][0]["imageUrl"], "");

    let response = server.get("/v1/catalog").await;
    assert_eq!(response.header("x-cache-status"), "fresh");
}

#[tokio::test]
async fn test_catalog_failure_maps_to_bad_gateway() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_catalog_status(500).await;
    let server = h.server();

    let response = server.get("/v1/catalog").await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn test_product_lookup() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_catalog(LegacyTestData::catalog()).await;
    let server = h.server();

    let response = server.get("/v1/products/P002").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "Suco de Laranja");

    let response = server.get("/v1/products/P999").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let response = server.get("/v1/categories/bebidas/products").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_product_additions_route() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_additions("P001", LegacyTestData::additions("P001")).await;
    let server = h.server();

    let response = server.get("/v1/products/P001/additions").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["found"], true);
    assert_eq!(body["groups"][0]["maxSelect"], 3);
}

#[tokio::test]
async fn test_coupon_and_referral_routes() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_coupon("SAVE10", LegacyTestData::coupon_valid("SAVE10")).await;
    h.legacy.mock_coupon("BADCODE", LegacyTestData::coupon_invalid()).await;
    h.legacy.mock_referral("ANA5", LegacyTestData::referral_valid()).await;
    let server = h.server();

    let response = server
        .post("/v1/coupons/validate")
        .json(&json!({ "code": "save10", "subtotal": 50.0 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["valid"], true);
    assert_eq!(body["discountType"], "percentage");

    let response = server
        .post("/v1/coupons/validate")
        .json(&json!({ "code": "BADCODE" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["valid"], false);

    let response = server
        .post("/v1/referrals/validate")
        .json(&json!({ "code": "ANA5" }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["referrerName"], "Ana");
}

#[tokio::test]
async fn test_delivery_quote_route() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_delivery(LegacyTestData::delivery(8.0)).await;
    let server = h.server();

    let response = server
        .post("/v1/delivery/quote")
        .json(&json!({ "neighborhood": "Centro", "subtotal": 30.0 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["fee"], 8.0);
    assert_eq!(body["etaMinutes"], 40);

    let response = server
        .post("/v1/delivery/quote")
        .json(&json!({ "neighborhood": "  " }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cache_invalidation_route() {
    let h = TestHarness::legacy_only().await;
    h.legacy.mock_catalog(LegacyTestData::catalog()).await;
    h.legacy.mock_coupon("SAVE10", LegacyTestData::coupon_valid("SAVE10")).await;
    let server = h.server();

    server.get("/v1/catalog").await.assert_status_ok();
    server
        .post("/v1/coupons/validate")
        .json(&json!({ "code": "SAVE10" }))
        .await
        .assert_status_ok();

    let response = server
        .post("/v1/cache/invalidate")
        .json(&json!({ "scope": "coupons", "key": "save10" }))
        .await;
    let body: InvalidateResponse = response.json();
    assert_eq!(
        body,
        InvalidateResponse {
            scope: CacheScope::Coupons,
            cleared: 1
        }
    );

    let response = server
        .post("/v1/cache/invalidate")
        .json(&json!({ "scope": "all" }))
        .await;
    let body: InvalidateResponse = response.json();
    assert_eq!(body.cleared, 1);

    let response = server.get("/v1/catalog").await;
    assert_eq!(response.header("x-cache-status"), "miss");
}

#[tokio::test]
async fn test_health_endpoints() {
    let h = TestHarness::legacy_only().await;
    let server = h.server();

    server.get("/health/live").await.assert_status_ok();
    server.get("/health/ready").await.assert_status_ok();

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["stats"]["cache_version"], "1.0.0");
    assert_eq!(body["stats"]["primary_backend"], false);
}
