//! Backend abstraction layer
//!
//! Two backends sit behind the data-access layer:
//! - the primary structured backend (fast, optional)
//! - the legacy action endpoint (slow, cold-start prone, always configured)
//!
//! `FallbackChain` tries them in that order and owns the retry policy.

pub mod chain;
pub mod legacy;
pub mod primary;
pub mod retry;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchResult;
use crate::models::{
    Catalog, CouponRequest, CouponResult, DeliveryQuote, DeliveryRequest, ProductAdditions,
    ReferralResult,
};

pub use chain::FallbackChain;
pub use legacy::LegacyClient;
pub use primary::PostgrestClient;
pub use retry::{execute_with_retry, RetryPolicy};

/// Operations understood by the legacy endpoint's `action` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyAction {
    GetCatalogData,
    ValidateCoupon,
    CalculateDelivery,
    GetProductWithAdditions,
    ValidateReferralCode,
}

impl LegacyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegacyAction::GetCatalogData => "getCatalogData",
            LegacyAction::ValidateCoupon => "validateCoupon",
            LegacyAction::CalculateDelivery => "calculateDelivery",
            LegacyAction::GetProductWithAdditions => "getProductWithAdditions",
            LegacyAction::ValidateReferralCode => "validateReferralCode",
        }
    }
}

/// One call to the legacy endpoint. A body turns the call into a POST.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRequest {
    pub action: LegacyAction,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl LegacyRequest {
    pub fn get(action: LegacyAction) -> Self {
        Self {
            action,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(action: LegacyAction, body: Value) -> Self {
        Self {
            action,
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }
}

/// Transport to the legacy action endpoint
///
/// Returns the raw JSON body; normalization and retries happen in the chain
/// so that a malformed payload counts as a failed attempt.
#[async_trait]
pub trait LegacyBackend: Send + Sync {
    async fn call(&self, request: &LegacyRequest) -> FetchResult<Value>;
}

/// The structured backend
///
/// Implementations return canonical models. Any error means "unavailable"
/// and the chain moves on to the legacy endpoint.
#[async_trait]
pub trait PrimaryBackend: Send + Sync {
    /// Backend name for logging and metrics
    fn name(&self) -> &'static str;

    async fn catalog(&self) -> FetchResult<Catalog>;

    async fn validate_coupon(&self, request: &CouponRequest) -> FetchResult<CouponResult>;

    async fn product_additions(&self, product_id: &str) -> FetchResult<ProductAdditions>;

    async fn validate_referral(&self, code: &str) -> FetchResult<ReferralResult>;

    async fn calculate_delivery(&self, request: &DeliveryRequest) -> FetchResult<DeliveryQuote>;
}
