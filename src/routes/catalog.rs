//! Catalog endpoints
//!
//! Everything here is answered from the tiered catalog, so a product page
//! and the catalog screen share one backend fetch.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{CanonicalProduct, ProductAdditions},
    AppState,
};

/// Response header carrying fresh/stale/miss/emergency
pub const CACHE_STATUS_HEADER: &str = "x-cache-status";

/// Full catalog
pub async fn get_catalog(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let served = state.storefront.catalog_served().await?;
    Ok((
        [(CACHE_STATUS_HEADER, served.status.as_str())],
        Json(served.data),
    ))
}

/// Single product
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<CanonicalProduct>> {
    state
        .storefront
        .product(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {}", id)))
}

/// Active products of one category
pub async fn get_category_products(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> AppResult<Json<Vec<CanonicalProduct>>> {
    Ok(Json(state.storefront.products_in_category(&category).await?))
}

/// Customization groups of a product; unknown products come back with
/// `found: false` rather than an error status
pub async fn get_product_additions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<ProductAdditions> {
    Json(state.storefront.product_additions(&id).await)
}
