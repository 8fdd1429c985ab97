//! Checkout lookups: coupons, referral codes, delivery quotes

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{CouponRequest, CouponResult, DeliveryQuote, DeliveryRequest, ReferralResult},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct ReferralRequest {
    pub code: String,
}

/// Coupon validation. Invalid coupons are a 200 with `valid: false`.
pub async fn validate_coupon(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CouponRequest>,
) -> Json<CouponResult> {
    Json(state.storefront.validate_coupon(&request).await)
}

pub async fn validate_referral(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReferralRequest>,
) -> Json<ReferralResult> {
    Json(state.storefront.validate_referral(&request.code).await)
}

/// Delivery quote for the current cart
pub async fn delivery_quote(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeliveryRequest>,
) -> AppResult<Json<DeliveryQuote>> {
    if request.neighborhood.trim().is_empty() {
        return Err(AppError::BadRequest("neighborhood is required".to_string()));
    }
    Ok(Json(state.storefront.calculate_delivery(&request).await?))
}
