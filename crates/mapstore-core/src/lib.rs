//! Core domain types and traits for mapstore metadata services.

pub mod authorization;
pub mod config;
pub mod context;
pub mod dbrp;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod permission;
pub mod tenant;
pub mod traits;

pub use authorization::{
    Authorization, AuthorizationFilter, AuthorizationStatus, AuthorizationUpdate,
    TOKEN_INDEX_BUCKET,
};
pub use config::MapstoreConfig;
pub use context::{Authorizer, RequestContext};
pub use dbrp::{DbrpMapping, DbrpMappingFilter};
pub use error::{BoxError, CoreError, CoreResult, ErrorCode};
pub use ids::{
    AuthorizationId, BucketId, IdError, MappingId, OrgId, PlatformId, RecordId, UserId,
    ID_ENCODED_LEN,
};
pub use permission::{Action, Permission, Resource, ResourceType};
pub use tenant::{Organization, User, UserStatus};
pub use traits::{
    AuthorizationService, CrudService, FindOptions, IndexEntry, Record, TenantService,
};
