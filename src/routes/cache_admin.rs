//! Cache-busting endpoint
//!
//! Used after an order is submitted (catalog stock changed) and by the
//! "force update" flow (everything).

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{error::AppResult, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    Catalog,
    Coupons,
    Additions,
    Referrals,
    All,
}

#[derive(Debug, Deserialize)]
pub struct InvalidateRequest {
    pub scope: CacheScope,
    /// Single coupon code, referral code or product id; whole scope when absent
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct InvalidateResponse {
    pub scope: CacheScope,
    pub cleared: usize,
}

pub async fn invalidate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InvalidateRequest>,
) -> AppResult<Json<InvalidateResponse>> {
    let storefront = &state.storefront;
    let key = request.key.as_deref();

    let cleared = match (request.scope, key) {
        (CacheScope::Catalog, _) => usize::from(storefront.invalidate_catalog()),
        (CacheScope::Coupons, Some(code)) => usize::from(storefront.clear_coupon(code)),
        (CacheScope::Coupons, None) => storefront.clear_coupons(),
        (CacheScope::Additions, Some(id)) => usize::from(storefront.clear_additions(id)),
        (CacheScope::Additions, None) => storefront.clear_all_additions(),
        (CacheScope::Referrals, Some(code)) => usize::from(storefront.clear_referral(code)),
        (CacheScope::Referrals, None) => storefront.clear_referrals(),
        (CacheScope::All, _) => storefront.invalidate_all(),
    };

    info!(scope = ?request.scope, key = ?key, cleared, "Cache invalidation requested");

    Ok(Json(InvalidateResponse {
        scope: request.scope,
        cleared,
    }))
}
