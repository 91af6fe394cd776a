use async_trait::async_trait;
use std::sync::Arc;

use mapstore_core::{
    Authorization, AuthorizationFilter, AuthorizationId, AuthorizationService, CoreError,
    CoreResult, CrudService, FindOptions, RecordId, RequestContext, ResourceType, TenantService,
};

use crate::authorized::AuthorizedService;
use crate::authorizer::{
    authorize_create, authorize_read, authorize_write_resource, verify_permissions,
};

/// Authorization decorator for token services.
///
/// Creating a token also resolves its owner from the caller and refuses
/// grants the caller does not hold itself.
pub struct AuthorizedTokenService<S> {
    checked: AuthorizedService<S>,
    tenants: Arc<dyn TenantService>,
}

impl<S> AuthorizedTokenService<S> {
    pub fn new(inner: S, tenants: Arc<dyn TenantService>) -> Self {
        Self {
            checked: AuthorizedService::new(inner),
            tenants,
        }
    }
}

#[async_trait]
impl<S> CrudService<Authorization> for AuthorizedTokenService<S>
where
    S: AuthorizationService,
{
    async fn find_by_id(
        &self,
        ctx: &RequestContext,
        id: AuthorizationId,
    ) -> CoreResult<Authorization> {
        self.checked.find_by_id(ctx, id).await
    }

    async fn find_many(
        &self,
        ctx: &RequestContext,
        filter: &AuthorizationFilter,
        opts: FindOptions,
    ) -> CoreResult<(Vec<Authorization>, usize)> {
        self.checked.find_many(ctx, filter, opts).await
    }

    async fn create(&self, ctx: &RequestContext, auth: &mut Authorization) -> CoreResult<()> {
        if !auth.user_id.is_valid() {
            let caller = ctx.authorizer().map_err(CoreError::unauthorized_access)?;
            let user = self.tenants.find_user_by_id(caller.user_id()).await?;
            auth.user_id = user.id;
        }

        authorize_create(ctx, ResourceType::Authorizations, auth.org_id)
            .map_err(CoreError::unauthorized_access)?;
        authorize_write_resource(ctx, ResourceType::Users, auth.user_id)
            .map_err(CoreError::unauthorized_access)?;
        verify_permissions(ctx, &auth.permissions).map_err(CoreError::unauthorized_access)?;

        self.checked.inner().create(ctx, auth).await
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        auth: &Authorization,
    ) -> CoreResult<Authorization> {
        self.checked.update(ctx, auth).await
    }

    async fn delete(&self, ctx: &RequestContext, id: AuthorizationId) -> CoreResult<()> {
        self.checked.delete(ctx, id).await
    }
}

#[async_trait]
impl<S> AuthorizationService for AuthorizedTokenService<S>
where
    S: AuthorizationService,
{
    async fn find_by_token(&self, ctx: &RequestContext, token: &str) -> CoreResult<Authorization> {
        let auth = self.checked.inner().find_by_token(ctx, token).await?;
        authorize_read(ctx, ResourceType::Authorizations, auth.id, Some(auth.org_id))
            .map_err(CoreError::unauthorized_access)?;
        Ok(auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{RandomIdGenerator, RandomTokenGenerator};
    use crate::tenant::MemoryTenantService;
    use crate::token::TokenService;
    use mapstore_core::{
        Action, ErrorCode, OrgId, Organization, Permission, Resource, User,
    };
    use mapstore_storage::MemoryKvStore;

    struct Fixture {
        svc: AuthorizedTokenService<Arc<TokenService>>,
        raw: Arc<TokenService>,
        org: Organization,
        user: User,
    }

    async fn fixture() -> Fixture {
        let tenants = Arc::new(MemoryTenantService::new());
        let org = Organization::new("acme");
        let user = User::new("ada");
        tenants.create_organization(&org).await.unwrap();
        tenants.create_user(&user).await.unwrap();

        let raw = Arc::new(
            TokenService::new(
                Arc::new(MemoryKvStore::new()),
                Arc::new(RandomIdGenerator),
                Arc::new(RandomTokenGenerator::default()),
                tenants.clone(),
            )
            .await
            .unwrap(),
        );
        Fixture {
            svc: AuthorizedTokenService::new(Arc::clone(&raw), tenants),
            raw,
            org,
            user,
        }
    }

    fn caller(f: &Fixture, perms: Vec<Permission>) -> RequestContext {
        let mut auth = Authorization::new(f.org.id, perms);
        auth.user_id = f.user.id;
        RequestContext::new().with_authorizer(Arc::new(auth))
    }

    fn token_admin(org: OrgId) -> Vec<Permission> {
        vec![
            Permission::new(Action::Read, Resource::in_org(ResourceType::Authorizations, org)),
            Permission::new(Action::Write, Resource::in_org(ResourceType::Authorizations, org)),
            Permission::new(Action::Write, Resource::all(ResourceType::Users)),
            Permission::new(Action::Read, Resource::in_org(ResourceType::Buckets, org)),
        ]
    }

    #[tokio::test]
    async fn test_create_resolves_user_from_caller() {
        let f = fixture().await;
        let ctx = caller(&f, token_admin(f.org.id));

        let mut auth = Authorization::new(
            f.org.id,
            vec![Permission::new(
                Action::Read,
                Resource::in_org(ResourceType::Buckets, f.org.id),
            )],
        );
        f.svc.create(&ctx, &mut auth).await.unwrap();

        assert_eq!(auth.user_id, f.user.id);
        assert!(!auth.token.is_empty());
        assert_eq!(f.svc.find_by_token(&ctx, &auth.token).await.unwrap().id, auth.id);
    }

    #[tokio::test]
    async fn test_escalation_is_rejected_and_nothing_written() {
        let f = fixture().await;
        let ctx = caller(&f, token_admin(f.org.id));

        let mut auth = Authorization::new(
            f.org.id,
            vec![Permission::new(
                Action::Write,
                Resource::in_org(ResourceType::Buckets, f.org.id),
            )],
        );
        let err = f.svc.create(&ctx, &mut auth).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);

        let (all, count) = f
            .raw
            .find_many(
                &RequestContext::new(),
                &AuthorizationFilter::default(),
                FindOptions::default(),
            )
            .await
            .unwrap();
        assert!(all.is_empty());
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_create_requires_write_on_user() {
        let f = fixture().await;
        let perms = vec![
            Permission::new(
                Action::Write,
                Resource::in_org(ResourceType::Authorizations, f.org.id),
            ),
            Permission::new(Action::Read, Resource::in_org(ResourceType::Buckets, f.org.id)),
        ];
        let ctx = caller(&f, perms);

        let mut auth = Authorization::new(
            f.org.id,
            vec![Permission::new(
                Action::Read,
                Resource::in_org(ResourceType::Buckets, f.org.id),
            )],
        );
        let err = f.svc.create(&ctx, &mut auth).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert!(err.to_string().contains("write:users/"));
    }

    #[tokio::test]
    async fn test_find_by_token_checks_read() {
        let f = fixture().await;
        let admin = caller(&f, token_admin(f.org.id));
        let mut auth = Authorization::new(
            f.org.id,
            vec![Permission::new(
                Action::Read,
                Resource::in_org(ResourceType::Buckets, f.org.id),
            )],
        );
        f.svc.create(&admin, &mut auth).await.unwrap();

        let outsider = caller(&f, token_admin(OrgId::new()));
        let err = f.svc.find_by_token(&outsider, &auth.token).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_partial_update_goes_through_checks() {
        let f = fixture().await;
        let admin = caller(&f, token_admin(f.org.id));
        let mut auth = Authorization::new(
            f.org.id,
            vec![Permission::new(
                Action::Read,
                Resource::in_org(ResourceType::Buckets, f.org.id),
            )],
        );
        f.svc.create(&admin, &mut auth).await.unwrap();

        let upd = mapstore_core::AuthorizationUpdate {
            status: None,
            description: Some("ci token".to_string()),
        };
        let scoped = caller(&f, token_admin(f.org.id)).with_org(f.org.id);
        let updated = f.svc.update_authorization(&scoped, auth.id, &upd).await.unwrap();
        assert_eq!(updated.description, "ci token");

        let outsider = caller(&f, token_admin(OrgId::new())).with_org(f.org.id);
        let err = f
            .svc
            .update_authorization(&outsider, auth.id, &upd)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    fn bucket_reader(org: OrgId) -> Authorization {
        Authorization::new(
            org,
            vec![Permission::new(
                Action::Read,
                Resource::in_org(ResourceType::Buckets, org),
            )],
        )
    }

    #[tokio::test]
    async fn test_update_cannot_widen_grants() {
        let f = fixture().await;
        let admin = caller(&f, token_admin(f.org.id));
        let mut auth = bucket_reader(f.org.id);
        f.svc.create(&admin, &mut auth).await.unwrap();

        let mut widened = auth.clone();
        widened.permissions = Permission::operator_permissions();
        let updated = f.svc.update(&admin, &widened).await.unwrap();
        assert_eq!(updated.permissions, auth.permissions);

        let stored = f.raw.find_by_id(&RequestContext::new(), auth.id).await.unwrap();
        assert_eq!(stored.permissions, auth.permissions);
    }

    #[tokio::test]
    async fn test_other_org_scope_cannot_see_or_delete_token() {
        let f = fixture().await;
        let admin = caller(&f, token_admin(f.org.id));
        let mut auth = bucket_reader(f.org.id);
        f.svc.create(&admin, &mut auth).await.unwrap();

        let other = OrgId::new();
        let outsider = caller(&f, token_admin(other)).with_org(other);

        let err = f.svc.find_by_id(&outsider, auth.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let upd = mapstore_core::AuthorizationUpdate {
            status: Some(mapstore_core::AuthorizationStatus::Inactive),
            description: None,
        };
        let err = f
            .svc
            .update_authorization(&outsider, auth.id, &upd)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        f.svc.delete(&outsider, auth.id).await.unwrap();

        let stored = f.raw.find_by_id(&RequestContext::new(), auth.id).await.unwrap();
        assert_eq!(stored, auth);
    }
}
