//! Health check endpoints
//!
//! - `/health` - Full health check with dependency status
//! - `/health/ready` - Readiness probe (marker store reachable)
//! - `/health/live` - Liveness probe

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual dependency check result
#[derive(Debug, Serialize)]
pub struct DependencyCheck {
    pub status: HealthStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DependencyChecks {
    pub marker_store: DependencyCheck,
}

/// Cache-layer facts worth seeing at a glance
#[derive(Debug, Serialize)]
pub struct HealthStats {
    pub uptime_seconds: u64,
    pub cache_version: String,
    pub primary_backend: bool,
    pub catalog_in_flight: bool,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: String,
    pub checks: DependencyChecks,
    pub stats: HealthStats,
}

/// Simple health response for liveness/readiness
#[derive(Debug, Serialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

async fn check_marker_store(state: &AppState) -> DependencyCheck {
    let start = Instant::now();

    match state.markers.ping().await {
        Ok(()) => DependencyCheck {
            status: HealthStatus::Healthy,
            latency_ms: start.elapsed().as_millis() as u64,
            error: None,
        },
        // markers are an optimisation; fetches keep working without them
        Err(e) => DependencyCheck {
            status: HealthStatus::Degraded,
            latency_ms: start.elapsed().as_millis() as u64,
            error: Some(e.to_string()),
        },
    }
}

/// Full health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let marker_check = check_marker_store(&state).await;
    let overall_status = marker_check.status.clone();

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        checks: DependencyChecks {
            marker_store: marker_check,
        },
        stats: HealthStats {
            uptime_seconds: state.start_time.elapsed().as_secs(),
            cache_version: state.storefront.cache_version().to_string(),
            primary_backend: state.storefront.has_primary(),
            catalog_in_flight: state.storefront.catalog_in_flight(),
        },
    };

    (StatusCode::OK, Json(response))
}

/// Readiness probe endpoint
///
/// 503 while the marker store cannot be reached.
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SimpleHealthResponse>) {
    let marker_check = check_marker_store(&state).await;

    if marker_check.status != HealthStatus::Healthy {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(SimpleHealthResponse {
                status: HealthStatus::Unhealthy,
            }),
        );
    }

    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}

/// Liveness probe endpoint
pub async fn liveness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}
