//! Token authentication middleware

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use mapstore_core::{Authorizer, CoreError, RequestContext};

use crate::error::ApiError;
use crate::state::AppState;

/// Pulls the token out of `Authorization: Token <t>` or `Authorization: Bearer <t>`.
///
/// Returns `Ok(None)` when the header is absent.
fn extract_token(headers: &HeaderMap) -> Result<Option<&str>, CoreError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| CoreError::unauthorized("authorization header is not valid text"))?;

    value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or_else(|| CoreError::unauthorized("authorization header must be `Token <token>`"))
}

/// Resolves the caller and stores a [`RequestContext`] in the request extensions.
///
/// Requests without a token header continue with an empty context; the
/// service decorators reject them.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = match &state.operator {
        Some(operator) => {
            RequestContext::new().with_authorizer(Arc::clone(operator) as Arc<dyn Authorizer>)
        }
        None => match extract_token(request.headers())? {
            Some(token) => {
                let auth = state
                    .tokens
                    .find_by_token(&RequestContext::new(), token)
                    .await
                    .map_err(|err| {
                        if err.is_not_found() {
                            warn!(path = %request.uri().path(), "unknown token");
                            CoreError::unauthorized("token is not valid")
                        } else {
                            err
                        }
                    })?;
                if !auth.is_active() {
                    warn!(authorization_id = %auth.id, "inactive token used");
                    return Err(CoreError::forbidden("authorization is inactive").into());
                }
                debug!(authorization_id = %auth.id, "caller authenticated");
                RequestContext::new().with_authorizer(Arc::new(auth))
            }
            None => RequestContext::new(),
        },
    };

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}
