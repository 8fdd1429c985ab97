//! Configuration management for Vitrine
//!
//! Configuration is loaded from environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::backend::RetryPolicy;
use crate::cache::TtlPolicy;

/// Cache version token used when `CACHE_VERSION` is not set
pub const DEFAULT_CACHE_VERSION: &str = "1.0.0";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Legacy action endpoint base URL
    pub legacy_api_url: String,
    /// Structured backend base URL (optional)
    pub primary_api_url: Option<String>,
    /// Structured backend API key (optional)
    pub primary_api_key: Option<String>,

    /// Redis URL for the durable version markers (optional)
    pub redis_url: Option<String>,

    /// Global cache version token
    pub cache_version: String,

    pub catalog_fresh_ttl_seconds: u64,
    pub catalog_stale_ttl_seconds: u64,
    /// TTL for coupon, additions and referral lookups
    pub lookup_ttl_seconds: u64,

    pub catalog_timeout_seconds: u64,
    pub lookup_timeout_seconds: u64,
    pub retry_delay_ms: u64,
    pub max_attempts: u32,

    /// Age after which the last-visit marker forces a full invalidation
    pub visit_marker_max_age_hours: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("VITRINE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("VITRINE_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid VITRINE_PORT")?,

            legacy_api_url: env::var("LEGACY_API_URL").context("LEGACY_API_URL must be set")?,
            primary_api_url: non_empty_var("PRIMARY_API_URL"),
            primary_api_key: non_empty_var("PRIMARY_API_KEY"),

            redis_url: non_empty_var("REDIS_URL"),

            cache_version: env::var("CACHE_VERSION")
                .unwrap_or_else(|_| DEFAULT_CACHE_VERSION.to_string()),

            catalog_fresh_ttl_seconds: parse_var("CATALOG_FRESH_TTL_SECONDS", 900)?,
            catalog_stale_ttl_seconds: parse_var("CATALOG_STALE_TTL_SECONDS", 3600)?,
            lookup_ttl_seconds: parse_var("LOOKUP_TTL_SECONDS", 300)?,

            catalog_timeout_seconds: parse_var("CATALOG_TIMEOUT_SECONDS", 15)?,
            lookup_timeout_seconds: parse_var("LOOKUP_TIMEOUT_SECONDS", 10)?,
            retry_delay_ms: parse_var("RETRY_DELAY_MS", 1000)?,
            max_attempts: parse_var("MAX_ATTEMPTS", 2)?,

            visit_marker_max_age_hours: parse_var("VISIT_MARKER_MAX_AGE_HOURS", 24)?,
        })
    }

    /// Whether the structured backend is fully configured
    pub fn primary_enabled(&self) -> bool {
        self.primary_api_url.is_some() && self.primary_api_key.is_some()
    }

    /// Fresh/stale tiers for the catalog
    pub fn catalog_ttl(&self) -> TtlPolicy {
        TtlPolicy::tiered(
            Duration::from_secs(self.catalog_fresh_ttl_seconds),
            Duration::from_secs(self.catalog_stale_ttl_seconds),
        )
    }

    /// Fresh-only tier for the secondary lookups
    pub fn lookup_ttl(&self) -> Duration {
        Duration::from_secs(self.lookup_ttl_seconds)
    }

    /// Retry policy for catalog-class requests
    pub fn catalog_retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            per_attempt_timeout: Duration::from_secs(self.catalog_timeout_seconds),
            inter_attempt_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    /// Retry policy for the smaller lookups
    pub fn lookup_retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            per_attempt_timeout: Duration::from_secs(self.lookup_timeout_seconds),
            inter_attempt_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn visit_marker_max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.visit_marker_max_age_hours as i64)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid {}: {}", name, raw)),
        Err(_) => Ok(default),
    }
}
