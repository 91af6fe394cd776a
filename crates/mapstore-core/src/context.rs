//! Per-request caller identity and scope.

use std::fmt;
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::ids::{OrgId, PlatformId, UserId};
use crate::permission::Permission;

/// An authenticated caller and the grants it holds.
pub trait Authorizer: Send + Sync + fmt::Debug {
    /// Grants held by this caller.
    fn permissions(&self) -> &[Permission];

    /// Identifier of the authorizer itself (for a token, the authorization ID).
    fn identifier(&self) -> PlatformId;

    /// User on whose behalf the caller acts.
    fn user_id(&self) -> UserId;

    /// Short label used in logs, e.g. `"authorization"`.
    fn kind(&self) -> &'static str;

    /// Inactive authorizers are rejected before any check runs.
    fn is_active(&self) -> bool {
        true
    }

    /// Returns `true` when any held grant allows `requested`.
    fn allowed(&self, requested: &Permission) -> bool {
        self.permissions().iter().any(|p| p.matches(requested))
    }
}

/// Explicit context threaded through every service call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    authorizer: Option<Arc<dyn Authorizer>>,
    org_id: Option<OrgId>,
}

impl RequestContext {
    /// Context without identity or organization scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the caller identity.
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    /// Narrows the context to one organization.
    #[must_use]
    pub fn with_org(mut self, org_id: OrgId) -> Self {
        self.org_id = Some(org_id);
        self
    }

    /// The caller identity.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Unauthorized`] when no identity is attached.
    pub fn authorizer(&self) -> CoreResult<&Arc<dyn Authorizer>> {
        self.authorizer
            .as_ref()
            .ok_or_else(|| CoreError::unauthorized("authorizer not found on context"))
    }

    /// Organization scope, when the caller supplied one.
    #[must_use]
    pub fn org_id(&self) -> Option<OrgId> {
        self.org_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::permission::{Action, Resource, ResourceType};

    #[derive(Debug)]
    struct Fixed(Vec<Permission>);

    impl Authorizer for Fixed {
        fn permissions(&self) -> &[Permission] {
            &self.0
        }

        fn identifier(&self) -> PlatformId {
            PlatformId::from_u64(1)
        }

        fn user_id(&self) -> UserId {
            UserId::from_u64(2)
        }

        fn kind(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn test_missing_authorizer_is_unauthorized() {
        let ctx = RequestContext::new();
        let err = ctx.authorizer().unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[test]
    fn test_context_carries_identity_and_org() {
        let org = OrgId::new();
        let perm = Permission::new(Action::Read, Resource::in_org(ResourceType::Dbrp, org));
        let ctx = RequestContext::new()
            .with_authorizer(Arc::new(Fixed(vec![perm])))
            .with_org(org);

        let auth = ctx.authorizer().unwrap();
        assert!(auth.is_active());
        assert!(auth.allowed(&perm));
        assert!(!auth.allowed(&Permission::new(
            Action::Write,
            Resource::in_org(ResourceType::Dbrp, org)
        )));
        assert_eq!(ctx.org_id(), Some(org));
    }
}
