//! Capability checks against the caller carried in a [`RequestContext`].

use std::sync::Arc;

use mapstore_core::metrics::AUTHZ_DENIALS;
use mapstore_core::{
    Action, Authorizer, CoreError, CoreResult, OrgId, Permission, PlatformId, RequestContext,
    Resource, ResourceType,
};

fn is_allowed(authorizer: &dyn Authorizer, requested: &Permission) -> CoreResult<()> {
    if authorizer.allowed(requested) {
        return Ok(());
    }

    AUTHZ_DENIALS
        .with_label_values(&[
            requested.resource.kind.as_str(),
            requested.action.as_str(),
        ])
        .inc();
    tracing::warn!(
        authorizer = authorizer.kind(),
        authorizer_id = %authorizer.identifier(),
        permission = %requested,
        "permission denied"
    );
    Err(CoreError::unauthorized(format!("{requested} is unauthorized")))
}

fn authorize(ctx: &RequestContext, requested: Permission) -> CoreResult<Arc<dyn Authorizer>> {
    let authorizer = ctx.authorizer()?;
    if !authorizer.is_active() {
        return Err(CoreError::forbidden("authorizer is inactive"));
    }
    is_allowed(authorizer.as_ref(), &requested)?;
    Ok(Arc::clone(authorizer))
}

/// Read access to one resource instance.
pub fn authorize_read(
    ctx: &RequestContext,
    kind: ResourceType,
    id: impl Into<PlatformId>,
    org_id: Option<OrgId>,
) -> CoreResult<Arc<dyn Authorizer>> {
    authorize(
        ctx,
        Permission::new(Action::Read, Resource::instance(kind, id, org_id)),
    )
}

/// Write access to one resource instance.
pub fn authorize_write(
    ctx: &RequestContext,
    kind: ResourceType,
    id: impl Into<PlatformId>,
    org_id: Option<OrgId>,
) -> CoreResult<Arc<dyn Authorizer>> {
    authorize(
        ctx,
        Permission::new(Action::Write, Resource::instance(kind, id, org_id)),
    )
}

/// Write access to a not-yet-existing resource inside an organization.
pub fn authorize_create(
    ctx: &RequestContext,
    kind: ResourceType,
    org_id: OrgId,
) -> CoreResult<Arc<dyn Authorizer>> {
    authorize_org_write_resource(ctx, kind, org_id)
}

/// Read access to every resource of a kind inside an organization.
pub fn authorize_org_read_resource(
    ctx: &RequestContext,
    kind: ResourceType,
    org_id: OrgId,
) -> CoreResult<Arc<dyn Authorizer>> {
    authorize(
        ctx,
        Permission::new(Action::Read, Resource::in_org(kind, org_id)),
    )
}

/// Write access to every resource of a kind inside an organization.
pub fn authorize_org_write_resource(
    ctx: &RequestContext,
    kind: ResourceType,
    org_id: OrgId,
) -> CoreResult<Arc<dyn Authorizer>> {
    authorize(
        ctx,
        Permission::new(Action::Write, Resource::in_org(kind, org_id)),
    )
}

/// Write access to one resource instance regardless of organization.
pub fn authorize_write_resource(
    ctx: &RequestContext,
    kind: ResourceType,
    id: impl Into<PlatformId>,
) -> CoreResult<Arc<dyn Authorizer>> {
    authorize(
        ctx,
        Permission::new(Action::Write, Resource::instance(kind, id, None)),
    )
}

/// Every permission in `requested` must itself be held by the caller.
pub fn verify_permissions(ctx: &RequestContext, requested: &[Permission]) -> CoreResult<()> {
    let authorizer = ctx.authorizer()?;
    if !authorizer.is_active() {
        return Err(CoreError::forbidden("authorizer is inactive"));
    }
    requested
        .iter()
        .try_for_each(|p| is_allowed(authorizer.as_ref(), p))
}
