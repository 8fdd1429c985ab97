//! Structured backend client
//!
//! Talks to a PostgREST-compatible REST interface: table selects under
//! `/rest/v1/{table}` and stored procedures under `/rest/v1/rpc/{name}`.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use super::PrimaryBackend;
use crate::{
    config::Config,
    error::{FetchError, FetchResult},
    metrics,
    models::{
        Catalog, CouponRequest, CouponResult, DeliveryQuote, DeliveryRequest, ProductAdditions,
        ReferralResult,
    },
    normalize::primary as normalize,
};

/// PostgREST client
pub struct PostgrestClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PostgrestClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Returns `None` unless both URL and key are configured
    pub fn from_config(client: reqwest::Client, config: &Config) -> Option<Self> {
        match (&config.primary_api_url, &config.primary_api_key) {
            (Some(url), Some(key)) => Some(Self::new(client, url.clone(), key.clone())),
            _ => None,
        }
    }

    async fn select(&self, table: &str, query: &[(&str, &str)]) -> FetchResult<Value> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        debug!(url = %url, "Selecting from primary backend");

        let request = self.client.get(&url).query(query);
        self.send(request, table).await
    }

    async fn rpc(&self, function: &str, args: &Value) -> FetchResult<Value> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, function);
        debug!(url = %url, "Calling primary backend RPC");

        let request = self.client.post(&url).json(args);
        self.send(request, function).await
    }

    async fn send(&self, request: reqwest::RequestBuilder, target: &str) -> FetchResult<Value> {
        let response = request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| {
                metrics::record_backend_request("primary", "network");
                FetchError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, target = %target, body = %text, "Primary backend request failed");
            metrics::record_backend_request("primary", "http_error");
            return Err(FetchError::Network(format!(
                "Primary API error {}: {}",
                status, text
            )));
        }

        let value = response.json::<Value>().await.map_err(|e| {
            metrics::record_backend_request("primary", "malformed");
            FetchError::MalformedResponse(format!("Failed to parse primary response: {}", e))
        })?;
        metrics::record_backend_request("primary", "ok");
        Ok(value)
    }
}

#[async_trait]
impl PrimaryBackend for PostgrestClient {
    fn name(&self) -> &'static str {
        "postgrest"
    }

    #[instrument(skip(self))]
    async fn catalog(&self) -> FetchResult<Catalog> {
        let (products, categories, banners) = tokio::try_join!(
            self.select("products", &[("select", "*"), ("active", "eq.true")]),
            self.select("categories", &[("select", "*"), ("order", "sort_order.asc")]),
            self.select("banners", &[("select", "*"), ("active", "eq.true")]),
        )?;
        normalize::catalog(&products, &categories, &banners)
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    async fn validate_coupon(&self, request: &CouponRequest) -> FetchResult<CouponResult> {
        let args = json!({
            "p_code": request.code,
            "p_customer_id": request.customer_id,
            "p_subtotal": request.subtotal,
        });
        let value = self.rpc("validate_coupon", &args).await?;
        normalize::coupon(&value, &request.code)
    }

    #[instrument(skip(self))]
    async fn product_additions(&self, product_id: &str) -> FetchResult<ProductAdditions> {
        let args = json!({ "p_product_id": product_id });
        let value = self.rpc("get_product_with_additions", &args).await?;
        normalize::product_additions(&value, product_id)
    }

    #[instrument(skip(self))]
    async fn validate_referral(&self, code: &str) -> FetchResult<ReferralResult> {
        let args = json!({ "p_code": code });
        let value = self.rpc("validate_referral_code", &args).await?;
        normalize::referral(&value, code)
    }

    #[instrument(skip(self, request), fields(neighborhood = %request.neighborhood))]
    async fn calculate_delivery(&self, request: &DeliveryRequest) -> FetchResult<DeliveryQuote> {
        let args = json!({
            "p_neighborhood": request.neighborhood,
            "p_postal_code": request.postal_code,
            "p_subtotal": request.subtotal,
        });
        let value = self.rpc("calculate_delivery", &args).await?;
        normalize::delivery(&value)
    }
}
