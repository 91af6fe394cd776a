//! DBRP mapping handlers, mounted under `/api/v2/dbrps`.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use tracing::{debug, info};

use mapstore_core::{
    CoreError, DbrpMapping, DbrpMappingFilter, FindOptions, MappingId, OrgId, RequestContext,
};

use super::{decode_json, parse_id, parse_optional_id, Envelope};
use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters of the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "orgID")]
    pub org_id: Option<String>,
    pub db: Option<String>,
    pub rp: Option<String>,
    pub cluster: Option<String>,
    #[serde(rename = "bucketID")]
    pub bucket_id: Option<String>,
    pub default: Option<String>,
}

/// Optional organization scope for single-record endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeParams {
    #[serde(rename = "orgID")]
    pub org_id: Option<String>,
}

/// Body of `PATCH /{id}`; only the default flag can change.
#[derive(Debug, Deserialize)]
pub struct PatchRequest {
    #[serde(alias = "default")]
    pub content: bool,
}

fn scoped(ctx: RequestContext, params: &ScopeParams) -> Result<RequestContext, CoreError> {
    Ok(match parse_optional_id::<OrgId>("orgID", params.org_id.as_deref())? {
        Some(org_id) => ctx.with_org(org_id),
        None => ctx,
    })
}

impl ListParams {
    fn into_filter(self) -> Result<DbrpMappingFilter, CoreError> {
        let org_id = match self.org_id.as_deref() {
            Some(raw) => parse_id::<OrgId>("orgID", raw)?,
            None => return Err(CoreError::invalid("orgID is required")),
        };
        let default = self
            .default
            .as_deref()
            .map(|raw| {
                raw.parse::<bool>()
                    .map_err(|_| CoreError::invalid(format!("invalid default: `{raw}`")))
            })
            .transpose()?;

        Ok(DbrpMappingFilter {
            id: None,
            org_id: Some(org_id),
            bucket_id: parse_optional_id("bucketID", self.bucket_id.as_deref())?,
            cluster: self.cluster,
            database: self.db,
            retention_policy: self.rp,
            default,
        })
    }
}

/// `POST /api/v2/dbrps`
pub async fn create_dbrp(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let mut mapping: DbrpMapping = decode_json(&body)?;
    debug!(
        org_id = %mapping.organization_id,
        database = %mapping.database,
        "creating dbrp mapping"
    );

    state.dbrps.create(&ctx, &mut mapping).await?;

    info!(id = %mapping.id, "dbrp mapping created");
    Ok((StatusCode::CREATED, Json(mapping)))
}

/// `GET /api/v2/dbrps?orgID=...`
pub async fn list_dbrps(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<ListParams>,
) -> Result<Json<Envelope<Vec<DbrpMapping>>>, ApiError> {
    let filter = params.into_filter()?;
    let ctx = match filter.org_id {
        Some(org_id) => ctx.with_org(org_id),
        None => ctx,
    };

    let (mappings, count) = state
        .dbrps
        .find_many(&ctx, &filter, FindOptions::default())
        .await?;
    debug!(count, "listed dbrp mappings");

    Ok(Json(Envelope { content: mappings }))
}

/// `GET /api/v2/dbrps/{id}`
pub async fn get_dbrp(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Query(params): Query<ScopeParams>,
) -> Result<Json<Envelope<DbrpMapping>>, ApiError> {
    let id: MappingId = parse_id("id", &id)?;
    let ctx = scoped(ctx, &params)?;

    let mapping = state.dbrps.find_by_id(&ctx, id).await?;
    Ok(Json(Envelope { content: mapping }))
}

/// `PATCH /api/v2/dbrps/{id}`
pub async fn patch_dbrp(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Query(params): Query<ScopeParams>,
    body: Bytes,
) -> Result<Json<Envelope<DbrpMapping>>, ApiError> {
    let id: MappingId = parse_id("id", &id)?;
    let ctx = scoped(ctx, &params)?;
    let patch: PatchRequest = decode_json(&body)?;

    let mut mapping = state.dbrps.find_by_id(&ctx, id).await?;
    mapping.default = patch.content;
    let updated = state.dbrps.update(&ctx, &mapping).await?;

    info!(id = %updated.id, default = updated.default, "dbrp mapping updated");
    Ok(Json(Envelope { content: updated }))
}

/// `DELETE /api/v2/dbrps/{id}`
pub async fn delete_dbrp(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Query(params): Query<ScopeParams>,
) -> Result<StatusCode, ApiError> {
    let id: MappingId = parse_id("id", &id)?;
    let ctx = scoped(ctx, &params)?;

    state.dbrps.delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapstore_core::{BucketId, ErrorCode};

    #[test]
    fn test_list_requires_org() {
        let err = ListParams::default().into_filter().unwrap_err();
        assert_eq!(err.code(), ErrorCode::Invalid);
        assert_eq!(err.to_string(), "orgID is required");
    }

    #[test]
    fn test_list_filter_fields() {
        let params = ListParams {
            org_id: Some("059af7ed2a034000".to_string()),
            db: Some("mydb".to_string()),
            rp: Some("autogen".to_string()),
            cluster: None,
            bucket_id: Some("000000000000000b".to_string()),
            default: Some("true".to_string()),
        };
        let filter = params.into_filter().unwrap();

        assert_eq!(filter.org_id, Some(OrgId::from_u64(0x059a_f7ed_2a03_4000)));
        assert_eq!(filter.bucket_id, Some(BucketId::from_u64(0xb)));
        assert_eq!(filter.database.as_deref(), Some("mydb"));
        assert_eq!(filter.retention_policy.as_deref(), Some("autogen"));
        assert_eq!(filter.default, Some(true));
        assert!(filter.cluster.is_none());
    }

    #[test]
    fn test_patch_accepts_either_field_name() {
        let content: PatchRequest = serde_json::from_str(r#"{"content": true}"#).unwrap();
        let default: PatchRequest = serde_json::from_str(r#"{"default": true}"#).unwrap();
        assert!(content.content);
        assert!(default.content);
    }
}
