//! Prometheus metrics for the lfsgate server.
//!
//! Exposes batch request outcomes, URL issuance counts, upload dedup skips and
//! identity verification failures.
//!
//! # Security Note
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping.
//! Labels never carry org, repository, OID or token data, but the counters do
//! expose aggregate usage.
//!
//! **Deployment Requirement**: The `/metrics` endpoint MUST be network-restricted
//! to authorized Prometheus scraper IPs only. This should be enforced at the
//! infrastructure level (firewall, load balancer, or reverse proxy rules).

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static BATCH_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "lfsgate_batch_requests_total",
            "Total batch requests by operation and response status",
        ),
        &["operation", "status"],
    )
    .expect("metric creation failed")
});

pub static OBJECTS_ISSUED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "lfsgate_objects_issued_total",
            "Total presigned URLs issued by operation",
        ),
        &["operation"],
    )
    .expect("metric creation failed")
});

pub static ISSUANCE_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "lfsgate_issuance_failures_total",
            "Total per-object issuance failures by operation and reason",
        ),
        &["operation", "reason"],
    )
    .expect("metric creation failed")
});

pub static UPLOADS_DEDUPLICATED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "lfsgate_uploads_deduplicated_total",
            "Total upload actions skipped because the object was already stored or repeated in the batch",
        ),
        &["source"],
    )
    .expect("metric creation failed")
});

pub static IDENTITY_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "lfsgate_identity_failures_total",
            "Total identity verification failures by provider and reason",
        ),
        &["provider", "reason"],
    )
    .expect("metric creation failed")
});

pub static ISSUANCE_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "lfsgate_issuance_duration_seconds",
            "Time taken to issue URLs for a whole batch",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["operation"],
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// This function is idempotent - subsequent calls after the first are no-ops.
/// This allows safe use in integration tests or when embedding multiple routers.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(BATCH_REQUESTS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(OBJECTS_ISSUED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ISSUANCE_FAILURES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPLOADS_DEDUPLICATED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(IDENTITY_FAILURES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ISSUANCE_DURATION.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Record the outcome of a batch request.
pub fn record_batch(operation: &str, status: StatusCode) {
    BATCH_REQUESTS
        .with_label_values(&[operation, status.as_str()])
        .inc();
}

/// Record an identity verification failure.
pub fn record_identity_failure(provider: &str, reason: &str) {
    IDENTITY_FAILURES
        .with_label_values(&[provider, reason])
        .inc();
}
