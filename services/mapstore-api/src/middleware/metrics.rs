//! Request metrics middleware

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Request, Response},
    middleware::Next,
};
use std::time::Instant;

use mapstore_core::metrics::{API_REQUEST_COUNT, API_REQUEST_DURATION};

/// Counts requests and records their latency, labelled by the matched route.
pub async fn track_metrics(req: Request<Body>, next: Next) -> Response<Body> {
    let start = Instant::now();
    let method = req.method().clone();

    // Route template, so IDs do not explode label cardinality.
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    API_REQUEST_COUNT
        .with_label_values(&[method.as_str(), &path, &status])
        .inc();
    API_REQUEST_DURATION
        .with_label_values(&[method.as_str(), &path])
        .observe(start.elapsed().as_secs_f64());

    response
}
