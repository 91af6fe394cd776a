//! Authorization decorator for any [`CrudService`].

use async_trait::async_trait;

use mapstore_core::{CoreError, CoreResult, CrudService, FindOptions, Record, RequestContext};

use crate::authorizer::{
    authorize_create, authorize_org_read_resource, authorize_read, authorize_write,
};

/// Checks the caller's permissions before delegating to `inner`.
///
/// A denied call returns `Unauthorized` without touching the wrapped service.
#[derive(Debug, Clone)]
pub struct AuthorizedService<S> {
    inner: S,
}

impl<S> AuthorizedService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// The undecorated service.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S> AuthorizedService<S> {
    /// Loads `id` through the inner service, hiding records outside the
    /// caller's organization scope.
    async fn find_in_scope<R>(&self, ctx: &RequestContext, id: R::Id) -> CoreResult<R>
    where
        R: Record,
        S: CrudService<R>,
    {
        let stored = self.inner.find_by_id(ctx, id).await?;
        match ctx.org_id() {
            Some(org_id) if org_id != stored.org_id() => Err(CoreError::not_found(R::ENTITY, id)),
            _ => Ok(stored),
        }
    }
}

#[async_trait]
impl<R, S> CrudService<R> for AuthorizedService<S>
where
    R: Record,
    S: CrudService<R>,
{
    async fn find_by_id(&self, ctx: &RequestContext, id: R::Id) -> CoreResult<R> {
        authorize_read(ctx, R::RESOURCE, id, ctx.org_id())
            .map_err(CoreError::unauthorized_access)?;
        self.find_in_scope(ctx, id).await
    }

    async fn find_many(
        &self,
        ctx: &RequestContext,
        filter: &R::Filter,
        opts: FindOptions,
    ) -> CoreResult<(Vec<R>, usize)> {
        let org_id = R::filter_org_id(filter).ok_or_else(|| {
            CoreError::invalid(format!(
                "an organization ID is required to list {} records",
                R::ENTITY
            ))
        })?;
        authorize_org_read_resource(ctx, R::RESOURCE, org_id)
            .map_err(CoreError::unauthorized_access)?;
        self.inner.find_many(ctx, filter, opts).await
    }

    async fn create(&self, ctx: &RequestContext, record: &mut R) -> CoreResult<()> {
        authorize_create(ctx, R::RESOURCE, record.org_id())
            .map_err(CoreError::unauthorized_access)?;
        self.inner.create(ctx, record).await
    }

    async fn update(&self, ctx: &RequestContext, record: &R) -> CoreResult<R> {
        authorize_write(ctx, R::RESOURCE, record.id(), Some(record.org_id()))
            .map_err(CoreError::unauthorized_access)?;

        // Moving a record between organizations needs write access to both.
        let stored = self.find_in_scope(ctx, record.id()).await?;
        if stored.org_id() != record.org_id() {
            authorize_write(ctx, R::RESOURCE, record.id(), Some(stored.org_id()))
                .map_err(CoreError::unauthorized_access)?;
        }

        self.inner.update(ctx, record).await
    }

    async fn delete(&self, ctx: &RequestContext, id: R::Id) -> CoreResult<()> {
        authorize_write(ctx, R::RESOURCE, id, ctx.org_id())
            .map_err(CoreError::unauthorized_access)?;

        // Absent, or outside the caller's scope: nothing to delete.
        match self.find_in_scope(ctx, id).await {
            Ok(_) => self.inner.delete(ctx, id).await,
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err),
        }
    }
}
