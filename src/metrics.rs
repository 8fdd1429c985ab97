//! Metric recorders
//!
//! Counters are no-ops until a recorder is installed; the binary installs
//! the Prometheus one in `routes::metrics::init_metrics`.

/// Cache lookup outcome per resource (fresh/stale/miss/emergency/hit/joined)
pub fn record_cache_operation(resource: &str, result: &str) {
    ::metrics::counter!(
        "vitrine_cache_operations_total",
        "resource" => resource.to_string(),
        "result" => result.to_string()
    )
    .increment(1);
}

/// One request to a backend
pub fn record_backend_request(backend: &str, outcome: &str) {
    ::metrics::counter!(
        "vitrine_backend_requests_total",
        "backend" => backend.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Background revalidation finished
pub fn record_revalidation(outcome: &str) {
    ::metrics::counter!("vitrine_revalidations_total", "outcome" => outcome.to_string())
        .increment(1);
}

/// A cache (or every cache) was emptied
pub fn record_invalidation(scope: &str) {
    ::metrics::counter!("vitrine_invalidations_total", "scope" => scope.to_string()).increment(1);
}
