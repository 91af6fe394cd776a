use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::authorization::{Authorization, AuthorizationUpdate};
use crate::context::RequestContext;
use crate::error::CoreResult;
use crate::ids::{AuthorizationId, OrgId, RecordId, UserId};
use crate::permission::ResourceType;
use crate::tenant::{Organization, User};

/// Secondary-index key owned by a record; the stored value is the record's encoded ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub bucket: &'static [u8],
    pub key: Vec<u8>,
}

/// A record kind persisted in its own bucket.
pub trait Record:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    type Id: RecordId;
    type Filter: fmt::Debug + Send + Sync;

    /// Entity name used in error messages.
    const ENTITY: &'static str;
    /// Primary bucket, keyed by encoded ID.
    const BUCKET: &'static [u8];
    /// Buckets holding secondary-index entries.
    const INDEX_BUCKETS: &'static [&'static [u8]] = &[];
    /// Resource type checked by the authorization decorator.
    const RESOURCE: ResourceType;

    fn id(&self) -> Self::Id;

    fn set_id(&mut self, id: Self::Id);

    /// Owning organization.
    fn org_id(&self) -> OrgId;

    /// Organization predicate of a filter, if set.
    fn filter_org_id(filter: &Self::Filter) -> Option<OrgId>;

    /// Returns `true` iff every predicate set in `filter` equals the record field.
    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Field-level validation run before every write.
    fn validate(&self) -> CoreResult<()> {
        Ok(())
    }

    /// Secondary-index keys that must be unique across the bucket.
    fn index_entries(&self) -> Vec<IndexEntry> {
        Vec::new()
    }
}

/// Paging applied after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub offset: usize,
    pub limit: Option<usize>,
    pub descending: bool,
}

impl FindOptions {
    /// Applies ordering, offset and limit to matches in ascending key order.
    #[must_use]
    pub fn apply<T>(&self, mut items: Vec<T>) -> Vec<T> {
        if self.descending {
            items.reverse();
        }
        items
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// CRUD contract shared by the store-backed services and their authorizing wrappers.
#[async_trait]
pub trait CrudService<R: Record>: Send + Sync {
    /// Fetches one record by ID.
    async fn find_by_id(&self, ctx: &RequestContext, id: R::Id) -> CoreResult<R>;

    /// Returns matching records and the number of matches before paging.
    async fn find_many(
        &self,
        ctx: &RequestContext,
        filter: &R::Filter,
        opts: FindOptions,
    ) -> CoreResult<(Vec<R>, usize)>;

    /// Persists a new record, assigning its ID when unset.
    async fn create(&self, ctx: &RequestContext, record: &mut R) -> CoreResult<()>;

    /// Replaces an existing record and returns what was stored.
    async fn update(&self, ctx: &RequestContext, record: &R) -> CoreResult<R>;

    /// Removes a record. Deleting an absent record succeeds.
    async fn delete(&self, ctx: &RequestContext, id: R::Id) -> CoreResult<()>;
}

#[async_trait]
impl<R, T> CrudService<R> for Arc<T>
where
    R: Record,
    T: CrudService<R> + ?Sized,
{
    async fn find_by_id(&self, ctx: &RequestContext, id: R::Id) -> CoreResult<R> {
        (**self).find_by_id(ctx, id).await
    }

    async fn find_many(
        &self,
        ctx: &RequestContext,
        filter: &R::Filter,
        opts: FindOptions,
    ) -> CoreResult<(Vec<R>, usize)> {
        (**self).find_many(ctx, filter, opts).await
    }

    async fn create(&self, ctx: &RequestContext, record: &mut R) -> CoreResult<()> {
        (**self).create(ctx, record).await
    }

    async fn update(&self, ctx: &RequestContext, record: &R) -> CoreResult<R> {
        (**self).update(ctx, record).await
    }

    async fn delete(&self, ctx: &RequestContext, id: R::Id) -> CoreResult<()> {
        (**self).delete(ctx, id).await
    }
}

/// Token-specific operations on top of authorization CRUD.
#[async_trait]
pub trait AuthorizationService: CrudService<Authorization> {
    /// Resolves a token value to its authorization.
    async fn find_by_token(&self, ctx: &RequestContext, token: &str) -> CoreResult<Authorization>;

    /// Applies a partial update to the mutable fields.
    async fn update_authorization(
        &self,
        ctx: &RequestContext,
        id: AuthorizationId,
        upd: &AuthorizationUpdate,
    ) -> CoreResult<Authorization> {
        let mut auth = self.find_by_id(ctx, id).await?;
        upd.apply(&mut auth);
        self.update(ctx, &auth).await
    }
}

#[async_trait]
impl<T> AuthorizationService for Arc<T>
where
    T: AuthorizationService + ?Sized,
{
    async fn find_by_token(&self, ctx: &RequestContext, token: &str) -> CoreResult<Authorization> {
        (**self).find_by_token(ctx, token).await
    }

    async fn update_authorization(
        &self,
        ctx: &RequestContext,
        id: AuthorizationId,
        upd: &AuthorizationUpdate,
    ) -> CoreResult<Authorization> {
        (**self).update_authorization(ctx, id, upd).await
    }
}

/// Identity lookups for users and organizations.
#[async_trait]
pub trait TenantService: Send + Sync {
    async fn find_user_by_id(&self, id: UserId) -> CoreResult<User>;

    async fn find_organization_by_id(&self, id: OrgId) -> CoreResult<Organization>;

    async fn create_user(&self, user: &User) -> CoreResult<()>;

    async fn create_organization(&self, org: &Organization) -> CoreResult<()>;
}
