//! API token handlers, mounted under `/api/v2/authorizations`.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use mapstore_core::{
    Authorization, AuthorizationFilter, AuthorizationId, AuthorizationStatus,
    AuthorizationUpdate, FindOptions, OrgId, Permission, RequestContext, UserId,
};

use super::{decode_json, parse_id, parse_optional_id};
use crate::error::ApiError;
use crate::state::AppState;

/// Body of `POST /api/v2/authorizations`.
#[derive(Debug, Deserialize)]
pub struct CreateAuthorizationRequest {
    #[serde(rename = "orgID")]
    pub org_id: OrgId,
    /// Defaults to the caller's user.
    #[serde(rename = "userID", default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<AuthorizationStatus>,
    pub permissions: Vec<Permission>,
}

impl From<CreateAuthorizationRequest> for Authorization {
    fn from(req: CreateAuthorizationRequest) -> Self {
        let mut auth = Authorization::new(req.org_id, req.permissions);
        auth.user_id = req.user_id.unwrap_or_default();
        auth.description = req.description.unwrap_or_default();
        auth.status = req.status.unwrap_or_default();
        auth
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "orgID")]
    pub org_id: Option<String>,
    #[serde(rename = "userID")]
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScopeParams {
    #[serde(rename = "orgID")]
    pub org_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthorizationList {
    pub authorizations: Vec<Authorization>,
}

fn scoped(ctx: RequestContext, org_id: Option<OrgId>) -> RequestContext {
    match org_id {
        Some(org_id) => ctx.with_org(org_id),
        None => ctx,
    }
}

/// `POST /api/v2/authorizations`
pub async fn create_authorization(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: CreateAuthorizationRequest = decode_json(&body)?;
    let mut auth = Authorization::from(req);

    state.authorizations.create(&ctx, &mut auth).await?;

    info!(id = %auth.id, org_id = %auth.org_id, user_id = %auth.user_id, "authorization created");
    Ok((StatusCode::CREATED, Json(auth)))
}

/// `GET /api/v2/authorizations?orgID=...&userID=...`
pub async fn list_authorizations(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<ListParams>,
) -> Result<Json<AuthorizationList>, ApiError> {
    let filter = AuthorizationFilter {
        org_id: parse_optional_id("orgID", params.org_id.as_deref())?,
        user_id: parse_optional_id("userID", params.user_id.as_deref())?,
        ..AuthorizationFilter::default()
    };
    let ctx = scoped(ctx, filter.org_id);

    let (authorizations, _) = state
        .authorizations
        .find_many(&ctx, &filter, FindOptions::default())
        .await?;
    Ok(Json(AuthorizationList { authorizations }))
}

/// `GET /api/v2/authorizations/{id}`
pub async fn get_authorization(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Query(params): Query<ScopeParams>,
) -> Result<Json<Authorization>, ApiError> {
    let id: AuthorizationId = parse_id("id", &id)?;
    let ctx = scoped(ctx, parse_optional_id("orgID", params.org_id.as_deref())?);

    Ok(Json(state.authorizations.find_by_id(&ctx, id).await?))
}

/// `PATCH /api/v2/authorizations/{id}`
pub async fn patch_authorization(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Query(params): Query<ScopeParams>,
    body: Bytes,
) -> Result<Json<Authorization>, ApiError> {
    let id: AuthorizationId = parse_id("id", &id)?;
    let ctx = scoped(ctx, parse_optional_id("orgID", params.org_id.as_deref())?);
    let upd: AuthorizationUpdate = decode_json(&body)?;

    let updated = state
        .authorizations
        .update_authorization(&ctx, id, &upd)
        .await?;

    info!(id = %updated.id, status = updated.status.as_str(), "authorization updated");
    Ok(Json(updated))
}

/// `DELETE /api/v2/authorizations/{id}`
pub async fn delete_authorization(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Query(params): Query<ScopeParams>,
) -> Result<StatusCode, ApiError> {
    let id: AuthorizationId = parse_id("id", &id)?;
    let ctx = scoped(ctx, parse_optional_id("orgID", params.org_id.as_deref())?);

    state.authorizations.delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapstore_core::{Action, Resource, ResourceType};

    #[test]
    fn test_create_request_defaults() {
        let req: CreateAuthorizationRequest = serde_json::from_str(
            r#"{
                "orgID": "059af7ed2a034000",
                "permissions": [
                    {"action": "read", "resource": {"type": "buckets", "orgID": "059af7ed2a034000"}}
                ]
            }"#,
        )
        .unwrap();
        let auth = Authorization::from(req);

        let org = OrgId::from_u64(0x059a_f7ed_2a03_4000);
        assert_eq!(auth.org_id, org);
        assert_eq!(auth.user_id, UserId::default());
        assert_eq!(auth.status, AuthorizationStatus::Active);
        assert!(auth.token.is_empty());
        assert_eq!(
            auth.permissions,
            vec![Permission::new(
                Action::Read,
                Resource::in_org(ResourceType::Buckets, org)
            )]
        );
    }
}
