//! In-memory user and organization directory.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use mapstore_core::{CoreError, CoreResult, OrgId, Organization, TenantService, User, UserId};

/// Tenant lookups backed by process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTenantService {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    orgs: Arc<RwLock<HashMap<OrgId, Organization>>>,
}

impl MemoryTenantService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantService for MemoryTenantService {
    async fn find_user_by_id(&self, id: UserId) -> CoreResult<User> {
        self.users
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("user", id))
    }

    async fn find_organization_by_id(&self, id: OrgId) -> CoreResult<Organization> {
        self.orgs
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("organization", id))
    }

    async fn create_user(&self, user: &User) -> CoreResult<()> {
        let mut users = self.users.write();
        if users.contains_key(&user.id) {
            return Err(CoreError::already_exists("user", user.id));
        }
        if users.values().any(|u| u.name == user.name) {
            return Err(CoreError::conflict(format!("user name `{}` is taken", user.name)));
        }
        users.insert(user.id, user.clone());
        tracing::info!(user_id = %user.id, name = %user.name, "user created");
        Ok(())
    }

    async fn create_organization(&self, org: &Organization) -> CoreResult<()> {
        let mut orgs = self.orgs.write();
        if orgs.contains_key(&org.id) {
            return Err(CoreError::already_exists("organization", org.id));
        }
        if orgs.values().any(|o| o.name == org.name) {
            return Err(CoreError::conflict(format!(
                "organization name `{}` is taken",
                org.name
            )));
        }
        orgs.insert(org.id, org.clone());
        tracing::info!(org_id = %org.id, name = %org.name, "organization created");
        Ok(())
    }
}
