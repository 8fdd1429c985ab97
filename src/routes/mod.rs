//! HTTP routes for Vitrine
//!
//! Thin handlers over `Storefront`; the storefront UI never talks to either
//! backend directly.

pub mod cache_admin;
pub mod catalog;
pub mod health;
pub mod lookups;
pub mod metrics;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let storefront_routes = Router::new()
        .route("/v1/catalog", get(catalog::get_catalog))
        .route("/v1/products/:id", get(catalog::get_product))
        .route("/v1/products/:id/additions", get(catalog::get_product_additions))
        .route("/v1/categories/:category/products", get(catalog::get_category_products))
        .route("/v1/coupons/validate", post(lookups::validate_coupon))
        .route("/v1/referrals/validate", post(lookups::validate_referral))
        .route("/v1/delivery/quote", post(lookups::delivery_quote))
        .route("/v1/cache/invalidate", post(cache_admin::invalidate));

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    Router::new()
        .merge(public_routes)
        .merge(storefront_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
