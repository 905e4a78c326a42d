//! Prometheus metrics: HTTP middleware, business counters and the
//! `/metrics` exporter.

use std::sync::OnceLock;
use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Records `http_requests_total` and `http_request_duration_seconds`,
/// labelled by the matched route template so slugs and ids do not explode
/// label cardinality.
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().as_str().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// A guest memory was stored.
pub fn record_memory_uploaded(bytes: usize) {
    counter!("memories_uploaded_total").increment(1);
    counter!("upload_bytes_total").increment(bytes as u64);
}

/// A guest upload was refused before reaching storage (`expired`,
/// `upload_limit`, `storage_limit`, `missing_file`, `rate_limited`).
pub fn record_upload_rejected(reason: &'static str) {
    counter!("uploads_rejected_total", "reason" => reason).increment(1);
}

/// The story writer failed and the caption was kept verbatim.
pub fn record_ai_fallback() {
    counter!("ai_fallbacks_total").increment(1);
}

/// A best-effort storage delete failed and the object was left behind.
pub fn record_storage_delete_failure() {
    counter!("storage_delete_failures_total").increment(1);
}

/// Handler for `GET /metrics`.
pub async fn metrics_handler() -> Response {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized",
        )
            .into_response(),
    }
}

/// Installs the global Prometheus recorder. Calling it again is a no-op.
pub fn init_metrics() -> Result<(), BuildError> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets(DURATION_BUCKETS)?
        .install_recorder()?;

    // Lost race with a concurrent initializer; its handle is equivalent.
    let _ = PROMETHEUS_HANDLE.set(handle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_metrics_middleware_passes_response_through() {
        let app = Router::new()
            .route("/api/events/:slug", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(metrics_middleware));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/events/anna-wedding-x1y2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_business_counters_without_recorder() {
        // No recorder installed: the macros are no-ops.
        record_memory_uploaded(51200);
        record_upload_rejected("expired");
        record_ai_fallback();
        record_storage_delete_failure();
    }

    #[test]
    fn test_duration_buckets_sorted() {
        assert!(DURATION_BUCKETS.windows(2).all(|w| w[0] < w[1]));
    }
}
