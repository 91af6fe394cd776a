//! Store-backed authorization (API token) service.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use mapstore_core::{
    Authorization, AuthorizationFilter, AuthorizationId, AuthorizationService, CoreError,
    CoreResult, CrudService, FindOptions, RecordId, RequestContext, TenantService,
    TOKEN_INDEX_BUCKET,
};
use mapstore_storage::{KvStore, StoreExt};

use crate::crud::KvCrudService;
use crate::generator::{IdGenerator, TokenGenerator};

/// Authorization records with a unique, immutable token per record.
pub struct TokenService {
    records: KvCrudService<Authorization>,
    tokens: Arc<dyn TokenGenerator>,
    tenants: Arc<dyn TenantService>,
}

impl TokenService {
    pub async fn new(
        store: Arc<dyn KvStore>,
        ids: Arc<dyn IdGenerator>,
        tokens: Arc<dyn TokenGenerator>,
        tenants: Arc<dyn TenantService>,
    ) -> CoreResult<Self> {
        Ok(Self {
            records: KvCrudService::new(store, ids).await?,
            tokens,
            tenants,
        })
    }
}

#[async_trait]
impl CrudService<Authorization> for TokenService {
    async fn find_by_id(
        &self,
        ctx: &RequestContext,
        id: AuthorizationId,
    ) -> CoreResult<Authorization> {
        self.records.find_by_id(ctx, id).await
    }

    async fn find_many(
        &self,
        ctx: &RequestContext,
        filter: &AuthorizationFilter,
        opts: FindOptions,
    ) -> CoreResult<(Vec<Authorization>, usize)> {
        self.records.find_many(ctx, filter, opts).await
    }

    async fn create(&self, ctx: &RequestContext, auth: &mut Authorization) -> CoreResult<()> {
        if !auth.user_id.is_valid() {
            return Err(CoreError::invalid("authorization must belong to a user"));
        }
        self.tenants.find_organization_by_id(auth.org_id).await?;
        self.tenants.find_user_by_id(auth.user_id).await?;

        if auth.token.is_empty() {
            auth.token = self.tokens.token()?;
        }
        let now = Utc::now();
        auth.created_at = now;
        auth.updated_at = now;

        self.records.create(ctx, auth).await
    }

    /// Only `status` and `description` change; every other field is kept
    /// from the stored record.
    async fn update(
        &self,
        ctx: &RequestContext,
        auth: &Authorization,
    ) -> CoreResult<Authorization> {
        let mut next = self.records.find_by_id(ctx, auth.id).await?;
        next.status = auth.status;
        next.description.clone_from(&auth.description);
        next.updated_at = Utc::now();

        self.records.update(ctx, &next).await
    }

    async fn delete(&self, ctx: &RequestContext, id: AuthorizationId) -> CoreResult<()> {
        self.records.delete(ctx, id).await
    }
}

#[async_trait]
impl AuthorizationService for TokenService {
    async fn find_by_token(&self, _ctx: &RequestContext, token: &str) -> CoreResult<Authorization> {
        if token.is_empty() {
            return Err(CoreError::invalid("token is empty"));
        }
        let index_key = token.as_bytes().to_vec();
        self.records
            .store()
            .view(move |tx| {
                KvCrudService::<Authorization>::read_indexed(tx, TOKEN_INDEX_BUCKET, &index_key)?
                    .ok_or_else(|| CoreError::not_found("authorization", "token"))
            })
            .await
    }
}
