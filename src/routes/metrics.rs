//! Prometheus metrics endpoint
//!
//! Exposes the data-access counters in Prometheus format.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    let _ = &*PROMETHEUS_HANDLE;
    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "vitrine_cache_operations_total",
        "Cache lookups by resource and result"
    );
    metrics::describe_counter!(
        "vitrine_backend_requests_total",
        "Backend requests by backend and outcome"
    );
    metrics::describe_counter!(
        "vitrine_revalidations_total",
        "Background revalidations by outcome"
    );
    metrics::describe_counter!(
        "vitrine_invalidations_total",
        "Cache invalidations by scope"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}
