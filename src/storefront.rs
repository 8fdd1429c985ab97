//! Storefront facade
//!
//! The one entry point callers use. Owns the catalog coordinator, the three
//! lookup caches and the version guard, and exposes the cache-control
//! operations used by flows like "order submitted" or "force update".

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::backend::{FallbackChain, LegacyClient, PostgrestClient, PrimaryBackend};
use crate::cache::{
    normalize_product_id, Invalidate, LookupCache, MarkerCheck, MarkerStore, TieredCache,
    TtlPolicy, VersionGuard,
};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, DEFAULT_CACHE_VERSION};
use crate::coordinator::{FetchCoordinator, Served};
use crate::error::FetchResult;
use crate::metrics;
use crate::models::{
    CanonicalProduct, Catalog, CouponRequest, CouponResult, DeliveryQuote, DeliveryRequest,
    ProductAdditions, ReferralResult,
};
use crate::normalize::normalize_code;
use crate::revalidator::RevalidationOutcome;

/// Key of the single catalog entry
pub const CATALOG_KEY: &str = "catalog";

const COUPON_RETRY_MESSAGE: &str = "Could not validate coupon, please try again";
const ADDITIONS_RETRY_MESSAGE: &str = "Could not load product options, please try again";
const REFERRAL_RETRY_MESSAGE: &str = "Could not validate referral code, please try again";

/// Cache tuning for a `Storefront`
#[derive(Debug, Clone)]
pub struct StorefrontOptions {
    pub cache_version: String,
    pub catalog_ttl: TtlPolicy,
    pub lookup_ttl: Duration,
    pub visit_marker_max_age: chrono::Duration,
}

impl StorefrontOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cache_version: config.cache_version.clone(),
            catalog_ttl: config.catalog_ttl(),
            lookup_ttl: config.lookup_ttl(),
            visit_marker_max_age: config.visit_marker_max_age(),
        }
    }
}

impl Default for StorefrontOptions {
    fn default() -> Self {
        Self {
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            catalog_ttl: TtlPolicy::CATALOG,
            lookup_ttl: Duration::from_secs(5 * 60),
            visit_marker_max_age: chrono::Duration::hours(24),
        }
    }
}

pub struct Storefront {
    chain: Arc<FallbackChain>,
    catalog: FetchCoordinator<Catalog>,
    coupons: Arc<LookupCache<CouponResult>>,
    additions: Arc<LookupCache<ProductAdditions>>,
    referrals: Arc<LookupCache<ReferralResult>>,
    guard: Arc<VersionGuard>,
}

impl Storefront {
    pub fn new(
        chain: Arc<FallbackChain>,
        markers: Arc<dyn MarkerStore>,
        clock: Arc<dyn Clock>,
        options: StorefrontOptions,
    ) -> Self {
        let catalog_cache = Arc::new(TieredCache::new(
            "catalog",
            clock.clone(),
            options.catalog_ttl,
            options.cache_version.clone(),
        ));
        let coupons = Arc::new(LookupCache::new(
            "coupons",
            clock.clone(),
            options.lookup_ttl,
            normalize_code,
        ));
        let additions = Arc::new(LookupCache::new(
            "additions",
            clock.clone(),
            options.lookup_ttl,
            normalize_product_id,
        ));
        let referrals = Arc::new(LookupCache::new(
            "referrals",
            clock,
            options.lookup_ttl,
            normalize_code,
        ));

        let targets: Vec<Arc<dyn Invalidate>> = vec![
            catalog_cache.clone(),
            coupons.clone(),
            additions.clone(),
            referrals.clone(),
        ];
        let guard = Arc::new(VersionGuard::new(
            markers,
            options.cache_version,
            options.visit_marker_max_age,
            targets,
        ));

        let catalog =
            FetchCoordinator::new(catalog_cache, chain.clone()).with_version_guard(guard.clone());

        Self {
            chain,
            catalog,
            coupons,
            additions,
            referrals,
            guard,
        }
    }

    /// Wire real backends from configuration
    pub fn from_config(
        config: &Config,
        http_client: reqwest::Client,
        markers: Arc<dyn MarkerStore>,
    ) -> Result<Self> {
        let legacy = Arc::new(LegacyClient::new(http_client.clone(), config));
        let primary = PostgrestClient::from_config(http_client, config)
            .map(|client| Arc::new(client) as Arc<dyn PrimaryBackend>);

        if primary.is_none() {
            info!("Primary backend not configured, using legacy endpoint only");
        }

        let chain = Arc::new(FallbackChain::new(
            primary,
            legacy,
            config.catalog_retry(),
            config.lookup_retry(),
        ));

        Ok(Self::new(
            chain,
            markers,
            Arc::new(SystemClock),
            StorefrontOptions::from_config(config),
        ))
    }

    /// Outcome of the durable marker check, running it if needed
    pub async fn check_markers(&self) -> MarkerCheck {
        self.guard.ensure_checked().await.clone()
    }

    pub fn cache_version(&self) -> &str {
        self.guard.version()
    }

    pub fn has_primary(&self) -> bool {
        self.chain.has_primary()
    }

    // --- catalog ---

    pub async fn catalog(&self) -> FetchResult<Catalog> {
        self.catalog.fetch_resource(CATALOG_KEY).await
    }

    pub async fn catalog_served(&self) -> FetchResult<Served<Catalog>> {
        self.catalog.fetch_served(CATALOG_KEY).await
    }

    /// Single product from the served catalog
    pub async fn product(&self, id: &str) -> FetchResult<Option<CanonicalProduct>> {
        let catalog = self.catalog().await?;
        Ok(catalog.product(id.trim()).cloned())
    }

    pub async fn products_in_category(&self, category: &str) -> FetchResult<Vec<CanonicalProduct>> {
        let catalog = self.catalog().await?;
        Ok(catalog.products_in_category(category))
    }

    // --- lookups ---

    /// Validate a coupon; failures come back as an invalid result
    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn validate_coupon(&self, request: &CouponRequest) -> CouponResult {
        let code = normalize_code(&request.code);
        if code.is_empty() {
            return CouponResult::invalid(code, "Coupon code is required");
        }

        self.guard.ensure_checked().await;
        let chain = self.chain.clone();
        let request = request.clone();
        let result = self
            .coupons
            .get_or_load(&code, move |code| async move {
                let request = CouponRequest { code, ..request };
                match chain.validate_coupon(&request).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(error = %e, "Coupon validation failed");
                        CouponResult::invalid(request.code, COUPON_RETRY_MESSAGE)
                    }
                }
            })
            .await;

        result.unwrap_or_else(|| CouponResult::invalid(code, COUPON_RETRY_MESSAGE))
    }

    /// Product customization groups; failures come back as not found
    #[instrument(skip(self))]
    pub async fn product_additions(&self, product_id: &str) -> ProductAdditions {
        let id = normalize_product_id(product_id);
        if id.is_empty() {
            return ProductAdditions::not_found(id, "Product id is required");
        }

        self.guard.ensure_checked().await;
        let chain = self.chain.clone();
        let result = self
            .additions
            .get_or_load(&id, move |id| async move {
                match chain.product_additions(&id).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(error = %e, "Product additions lookup failed");
                        ProductAdditions::not_found(id, ADDITIONS_RETRY_MESSAGE)
                    }
                }
            })
            .await;

        result.unwrap_or_else(|| ProductAdditions::not_found(id, ADDITIONS_RETRY_MESSAGE))
    }

    #[instrument(skip(self))]
    pub async fn validate_referral(&self, code: &str) -> ReferralResult {
        let code = normalize_code(code);
        if code.is_empty() {
            return ReferralResult::invalid(code, "Referral code is required");
        }

        self.guard.ensure_checked().await;
        let chain = self.chain.clone();
        let result = self
            .referrals
            .get_or_load(&code, move |code| async move {
                match chain.validate_referral(&code).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(error = %e, "Referral validation failed");
                        ReferralResult::invalid(code, REFERRAL_RETRY_MESSAGE)
                    }
                }
            })
            .await;

        result.unwrap_or_else(|| ReferralResult::invalid(code, REFERRAL_RETRY_MESSAGE))
    }

    /// Delivery fee for a cart; never cached
    pub async fn calculate_delivery(&self, request: &DeliveryRequest) -> FetchResult<DeliveryQuote> {
        self.chain.calculate_delivery(request).await
    }

    // --- cache control ---

    pub fn invalidate_catalog(&self) -> bool {
        let removed = self.catalog.cache().invalidate(CATALOG_KEY);
        info!(removed, "Catalog cache invalidated");
        metrics::record_invalidation("catalog");
        removed
    }

    pub fn clear_coupon(&self, code: &str) -> bool {
        metrics::record_invalidation("coupons");
        self.coupons.invalidate(code)
    }

    pub fn clear_coupons(&self) -> usize {
        metrics::record_invalidation("coupons");
        self.coupons.clear()
    }

    pub fn clear_additions(&self, product_id: &str) -> bool {
        metrics::record_invalidation("additions");
        self.additions.invalidate(product_id)
    }

    pub fn clear_all_additions(&self) -> usize {
        metrics::record_invalidation("additions");
        self.additions.clear()
    }

    pub fn clear_referral(&self, code: &str) -> bool {
        metrics::record_invalidation("referrals");
        self.referrals.invalidate(code)
    }

    pub fn clear_referrals(&self) -> usize {
        metrics::record_invalidation("referrals");
        self.referrals.clear()
    }

    /// Force update: drop every cached entry
    pub fn invalidate_all(&self) -> usize {
        let cleared = self.catalog.cache().invalidate_all()
            + self.coupons.invalidate_all()
            + self.additions.invalidate_all()
            + self.referrals.invalidate_all();
        info!(cleared, "All caches invalidated");
        metrics::record_invalidation("all");
        cleared
    }

    pub fn subscribe_revalidations(&self) -> broadcast::Receiver<RevalidationOutcome> {
        self.catalog.subscribe_revalidations()
    }

    /// Whether a catalog fetch is currently unresolved
    pub fn catalog_in_flight(&self) -> bool {
        let in_flight = self.catalog.in_flight(CATALOG_KEY);
        debug!(in_flight, "Catalog fetch state");
        in_flight
    }
}
