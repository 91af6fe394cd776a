use crate::{
    error::ApiError,
    handlers::{
        authorizations::{
            create_authorization, delete_authorization, get_authorization, list_authorizations,
            patch_authorization,
        },
        dbrp::{create_dbrp, delete_dbrp, get_dbrp, list_dbrps, patch_dbrp},
        health_check, metrics_handler,
    },
    middleware::{authenticate, track_metrics},
    state::AppState,
};
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, Uri},
    middleware,
    response::Response,
    routing::get,
    Router,
};
use mapstore_core::CoreError;
use tower::ServiceBuilder;
use tower_http::{
    classify::ServerErrorsFailureClass,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info_span, Span};
use uuid::Uuid;

/// Header carrying the per-request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Fresh v4 UUID per request, unless the client sent one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Builds the Axum router hosting the REST API.
///
/// `/health` and `/metrics` are public; everything under `/api/v2` runs
/// behind token authentication.
pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.max_body_bytes;

    let api = Router::new()
        .route("/api/v2/dbrps", get(list_dbrps).post(create_dbrp))
        .route(
            "/api/v2/dbrps/:id",
            get(get_dbrp).patch(patch_dbrp).delete(delete_dbrp),
        )
        .route(
            "/api/v2/authorizations",
            get(list_authorizations).post(create_authorization),
        )
        .route(
            "/api/v2/authorizations/:id",
            get(get_authorization)
                .patch(patch_authorization)
                .delete(delete_authorization),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .merge(api)
        // Metrics per matched route; applied to routes only so MatchedPath is set
        .route_layer(middleware::from_fn(track_metrics))
        .fallback(route_not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request| {
                            let request_id = request
                                .headers()
                                .get(REQUEST_ID_HEADER)
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or_default();
                            info_span!(
                                "http_request",
                                request_id = %request_id,
                                method = %request.method(),
                                uri = %request.uri(),
                                version = ?request.version(),
                            )
                        })
                        .on_request(|_request: &Request, _span: &Span| {
                            tracing::debug!("started processing request");
                        })
                        .on_response(
                            |response: &Response, latency: std::time::Duration, _span: &Span| {
                                let status = response.status();
                                let latency_ms = latency.as_millis();

                                if status.is_server_error() {
                                    tracing::error!(
                                        status = %status,
                                        latency_ms = latency_ms,
                                        "request failed with server error"
                                    );
                                } else if status.is_client_error() {
                                    tracing::warn!(
                                        status = %status,
                                        latency_ms = latency_ms,
                                        "request failed with client error"
                                    );
                                } else {
                                    tracing::info!(
                                        status = %status,
                                        latency_ms = latency_ms,
                                        "request completed"
                                    );
                                }
                            },
                        )
                        .on_failure(
                            |failure_class: ServerErrorsFailureClass,
                             latency: std::time::Duration,
                             _span: &Span| {
                                tracing::error!(
                                    failure_class = ?failure_class,
                                    latency_ms = latency.as_millis(),
                                    "request failed"
                                );
                            },
                        ),
                )
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

async fn route_not_found(uri: Uri) -> ApiError {
    CoreError::not_found("route", uri.path()).into()
}
