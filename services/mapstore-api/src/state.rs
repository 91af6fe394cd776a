//! Shared state handed to every handler.

use std::sync::Arc;

use mapstore_core::{Authorization, AuthorizationService, CrudService, DbrpMapping, TenantService};
use mapstore_service::{AuthorizedService, AuthorizedTokenService, DbrpService, TokenService};
use mapstore_storage::KvStore;

/// Shared application state for the API server
#[derive(Clone)]
pub struct AppState {
    /// Record store, closed on shutdown
    pub store: Arc<dyn KvStore>,
    /// User and organization directory
    pub tenants: Arc<dyn TenantService>,
    /// DBRP mappings behind the authorization decorator
    pub dbrps: Arc<dyn CrudService<DbrpMapping>>,
    /// Tokens behind the authorization decorator
    pub authorizations: Arc<dyn AuthorizationService>,
    /// Undecorated token lookups used to authenticate callers
    pub tokens: Arc<dyn AuthorizationService>,
    /// Identity attached to every request when authentication is disabled
    pub operator: Option<Arc<Authorization>>,
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl AppState {
    /// Wires the decorated services around the store-backed ones.
    pub fn new(
        store: Arc<dyn KvStore>,
        tenants: Arc<dyn TenantService>,
        dbrps: DbrpService,
        tokens: Arc<TokenService>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            store,
            dbrps: Arc::new(AuthorizedService::new(dbrps)),
            authorizations: Arc::new(AuthorizedTokenService::new(
                Arc::clone(&tokens),
                Arc::clone(&tenants),
            )),
            tokens,
            tenants,
            operator: None,
            max_body_bytes,
        }
    }

    /// Runs every request as `operator` instead of reading the token header.
    #[must_use]
    pub fn without_authentication(mut self, operator: Authorization) -> Self {
        self.operator = Some(Arc::new(operator));
        self
    }
}
