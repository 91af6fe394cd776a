//! Service wiring and first-start seeding.
//!
//! The operator organization, user and authorization are created before the
//! listener binds, so a fresh server always has one caller able to mint
//! further tokens.

use std::sync::Arc;

use tracing::{info, warn};

use mapstore_core::{
    config::AuthConfig, Authorization, CoreResult, CrudService, MapstoreConfig, Organization,
    Permission, RequestContext, TenantService, User,
};
use mapstore_service::{
    DbrpService, MemoryTenantService, RandomIdGenerator, RandomTokenGenerator, TokenService,
};
use mapstore_storage::{KvStore, MemoryKvStore};

use crate::state::AppState;

/// Builds every service over a fresh in-memory store and seeds the operator.
///
/// Returns the state together with the operator authorization.
pub async fn bootstrap(config: &MapstoreConfig) -> CoreResult<(AppState, Authorization)> {
    let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    let tenants: Arc<dyn TenantService> = Arc::new(MemoryTenantService::new());
    let ids = Arc::new(RandomIdGenerator);

    let dbrps = DbrpService::new(Arc::clone(&store), ids.clone()).await?;
    let tokens = Arc::new(
        TokenService::new(
            Arc::clone(&store),
            ids,
            Arc::new(RandomTokenGenerator::new(config.store.token_bytes)),
            Arc::clone(&tenants),
        )
        .await?,
    );

    let operator = seed_operator(tenants.as_ref(), tokens.as_ref(), &config.auth).await?;

    let state = AppState::new(
        store,
        tenants,
        dbrps,
        tokens,
        config.server.max_body_bytes,
    );
    let state = if config.auth.enabled {
        state
    } else {
        warn!("authentication is disabled; every request runs as the operator");
        state.without_authentication(operator.clone())
    };

    Ok((state, operator))
}

/// Creates the operator organization, user and all-access authorization.
pub async fn seed_operator(
    tenants: &dyn TenantService,
    tokens: &TokenService,
    auth: &AuthConfig,
) -> CoreResult<Authorization> {
    let org = Organization::new(auth.operator_org.clone());
    let user = User::new(auth.operator_user.clone());
    tenants.create_organization(&org).await?;
    tenants.create_user(&user).await?;

    let mut operator = Authorization::new(org.id, Permission::operator_permissions());
    operator.user_id = user.id;
    operator.description = format!("{}'s operator token", user.name);
    if let Some(token) = &auth.operator_token {
        operator.token.clone_from(token);
    }

    tokens.create(&RequestContext::new(), &mut operator).await?;

    if auth.operator_token.is_some() {
        info!(org = %org.name, user = %user.name, "operator token seeded from configuration");
    } else {
        info!(
            org = %org.name,
            user = %user.name,
            token = %operator.token,
            "operator token generated"
        );
    }
    Ok(operator)
}
