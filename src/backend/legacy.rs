//! Legacy action endpoint client
//!
//! HTTP client for the spreadsheet-backed automation endpoint. Every
//! operation is the same URL with a different `action` query parameter.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, instrument};

use super::{LegacyBackend, LegacyRequest};
use crate::{
    config::Config,
    error::{FetchError, FetchResult},
    metrics,
};

/// Legacy endpoint client
pub struct LegacyClient {
    client: reqwest::Client,
    base_url: String,
}

impl LegacyClient {
    /// Create a new legacy client
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self::with_base_url(client, config.legacy_api_url.clone())
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl LegacyBackend for LegacyClient {
    #[instrument(skip(self, request), fields(action = request.action.as_str()))]
    async fn call(&self, request: &LegacyRequest) -> FetchResult<Value> {
        let mut query: Vec<(&str, &str)> = vec![("action", request.action.as_str())];
        query.extend(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        debug!(url = %self.base_url, "Calling legacy endpoint");

        let builder = match &request.body {
            Some(body) => self.client.post(&self.base_url).query(&query).json(body),
            None => self.client.get(&self.base_url).query(&query),
        };

        let response = builder.send().await.map_err(|e| {
            error!(error = %e, "Failed to send request to legacy endpoint");
            metrics::record_backend_request("legacy", "network");
            FetchError::from(e)
        })?;

        let status = response.status();
        debug!(status = %status, "Legacy response status");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "Legacy request failed");
            metrics::record_backend_request("legacy", "http_error");
            return Err(FetchError::Network(format!(
                "Legacy API error {}: {}",
                status, text
            )));
        }

        let body = response.text().await?;
        debug!(body_len = body.len(), "Legacy response body received");

        match serde_json::from_str(&body) {
            Ok(value) => {
                metrics::record_backend_request("legacy", "ok");
                Ok(value)
            }
            Err(e) => {
                error!(error = %e, "Failed to parse legacy response");
                metrics::record_backend_request("legacy", "malformed");
                Err(FetchError::MalformedResponse(format!(
                    "Failed to parse legacy response: {}",
                    e
                )))
            }
        }
    }
}
