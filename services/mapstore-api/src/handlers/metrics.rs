//! Prometheus metrics endpoint handler

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, TextEncoder};
use tracing::error;

/// `GET /metrics` in the Prometheus text exposition format.
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            [(header::CONTENT_TYPE, encoder.format_type().to_string())],
            buffer,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {e}"),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use mapstore_core::metrics::API_REQUEST_COUNT;

    #[tokio::test]
    async fn test_metrics_endpoint() {
        API_REQUEST_COUNT
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let response = metrics_handler().await;
        assert_eq!(response.status(), StatusCode::OK);

        let content_type = response.headers().get("content-type").unwrap();
        assert!(content_type
            .to_str()
            .unwrap()
            .contains("text/plain; version=0.0.4"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("# TYPE mapstore_api_requests_total counter"));
    }
}
