//! Backend fallback chain
//!
//! Per operation: one timeout-bounded attempt against the primary backend if it is
//! configured, then the legacy endpoint under the retry policy. Primary
//! failures are never surfaced. Normalization runs inside each legacy
//! attempt, so a malformed payload is retried like a network failure.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{
    execute_with_retry, LegacyAction, LegacyBackend, LegacyRequest, PrimaryBackend, RetryPolicy,
};
use crate::{
    coordinator::ResourceLoader,
    error::{FetchError, FetchResult},
    models::{
        Catalog, CouponRequest, CouponResult, DeliveryQuote, DeliveryRequest, ProductAdditions,
        ReferralResult,
    },
    normalize::legacy as normalize,
};

/// Ordered primary -> legacy attempt sequence
pub struct FallbackChain {
    primary: Option<Arc<dyn PrimaryBackend>>,
    legacy: Arc<dyn LegacyBackend>,
    catalog_policy: RetryPolicy,
    lookup_policy: RetryPolicy,
}

impl FallbackChain {
    pub fn new(
        primary: Option<Arc<dyn PrimaryBackend>>,
        legacy: Arc<dyn LegacyBackend>,
        catalog_policy: RetryPolicy,
        lookup_policy: RetryPolicy,
    ) -> Self {
        Self {
            primary,
            legacy,
            catalog_policy,
            lookup_policy,
        }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// One attempt against the primary backend; `None` means fall through
    async fn try_primary<'a, T, F, Fut>(
        &'a self,
        operation: &str,
        policy: &RetryPolicy,
        call: F,
    ) -> Option<T>
    where
        F: FnOnce(&'a dyn PrimaryBackend) -> Fut,
        Fut: Future<Output = FetchResult<T>> + 'a,
    {
        let primary = self.primary.as_deref()?;

        let outcome = match tokio::time::timeout(policy.per_attempt_timeout, call(primary)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(policy.per_attempt_timeout)),
        };

        match outcome {
            Ok(value) => {
                debug!(operation = %operation, backend = primary.name(), "Served by primary backend");
                Some(value)
            }
            Err(e) => {
                debug!(
                    operation = %operation,
                    backend = primary.name(),
                    error = %e,
                    "Primary backend unavailable, falling back to legacy"
                );
                None
            }
        }
    }

    async fn call_legacy<T>(
        &self,
        operation: &str,
        policy: &RetryPolicy,
        request: LegacyRequest,
        normalize: impl Fn(&Value) -> FetchResult<T>,
    ) -> FetchResult<T> {
        let legacy = &self.legacy;
        let request = &request;
        let normalize = &normalize;

        execute_with_retry(policy, operation, |_| async move {
            let body = legacy.call(request).await?;
            normalize(&body)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn fetch_catalog(&self) -> FetchResult<Catalog> {
        let policy = self.catalog_policy;
        if let Some(catalog) = self
            .try_primary("catalog", &policy, |p| p.catalog())
            .await
        {
            return Ok(catalog);
        }

        self.call_legacy(
            "catalog",
            &policy,
            LegacyRequest::get(LegacyAction::GetCatalogData),
            normalize::catalog,
        )
        .await
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn validate_coupon(&self, request: &CouponRequest) -> FetchResult<CouponResult> {
        let policy = self.lookup_policy;
        if let Some(result) = self
            .try_primary("coupon", &policy, |p| p.validate_coupon(request))
            .await
        {
            return Ok(result);
        }

        let mut legacy = LegacyRequest::get(LegacyAction::ValidateCoupon)
            .param("codigo", &request.code)
            .param("subtotal", request.subtotal);
        if let Some(customer_id) = &request.customer_id {
            legacy = legacy.param("cliente", customer_id);
        }

        self.call_legacy("coupon", &policy, legacy, |body| {
            normalize::coupon(body, &request.code)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn product_additions(&self, product_id: &str) -> FetchResult<ProductAdditions> {
        let policy = self.lookup_policy;
        if let Some(result) = self
            .try_primary("additions", &policy, |p| p.product_additions(product_id))
            .await
        {
            return Ok(result);
        }

        let legacy = LegacyRequest::get(LegacyAction::GetProductWithAdditions)
            .param("productId", product_id);

        self.call_legacy("additions", &policy, legacy, |body| {
            normalize::product_additions(body, product_id)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn validate_referral(&self, code: &str) -> FetchResult<ReferralResult> {
        let policy = self.lookup_policy;
        if let Some(result) = self
            .try_primary("referral", &policy, |p| p.validate_referral(code))
            .await
        {
            return Ok(result);
        }

        let legacy = LegacyRequest::get(LegacyAction::ValidateReferralCode).param("codigo", code);

        self.call_legacy("referral", &policy, legacy, |body| {
            normalize::referral(body, code)
        })
        .await
    }

    #[instrument(skip(self, request), fields(neighborhood = %request.neighborhood))]
    pub async fn calculate_delivery(&self, request: &DeliveryRequest) -> FetchResult<DeliveryQuote> {
        let policy = self.lookup_policy;
        if let Some(quote) = self
            .try_primary("delivery", &policy, |p| p.calculate_delivery(request))
            .await
        {
            return Ok(quote);
        }

        let legacy = LegacyRequest::post(
            LegacyAction::CalculateDelivery,
            json!({
                "bairro": request.neighborhood,
                "cep": request.postal_code,
                "subtotal": request.subtotal,
            }),
        );

        self.call_legacy("delivery", &policy, legacy, normalize::delivery)
            .await
    }
}

#[async_trait]
impl ResourceLoader<Catalog> for FallbackChain {
    async fn load(&self, _key: &str) -> FetchResult<Catalog> {
        self.fetch_catalog().await
    }
}
