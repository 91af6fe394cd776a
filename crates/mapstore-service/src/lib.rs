//! Service layer for mapstore.
//! Store-backed CRUD for DBRP mappings and tokens, plus authorizing decorators.

pub mod authorized;
pub mod authorized_token;
pub mod authorizer;
pub mod crud;
pub mod generator;
pub mod tenant;
pub mod token;

use mapstore_core::DbrpMapping;

pub use authorized::AuthorizedService;
pub use authorized_token::AuthorizedTokenService;
pub use crud::KvCrudService;
pub use generator::{IdGenerator, RandomIdGenerator, RandomTokenGenerator, TokenGenerator};
pub use tenant::MemoryTenantService;
pub use token::TokenService;

/// Store-backed DBRP mapping service.
pub type DbrpService = KvCrudService<DbrpMapping>;
