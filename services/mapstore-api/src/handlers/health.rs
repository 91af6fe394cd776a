//! Liveness endpoint

use axum::response::IntoResponse;
use tracing::debug;

/// `GET /health`; answers as long as the process serves requests.
pub async fn health_check() -> impl IntoResponse {
    debug!("health check requested");
    "ok"
}
