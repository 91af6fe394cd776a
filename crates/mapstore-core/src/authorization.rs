//! API-token authorizations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::context::Authorizer;
use crate::error::{CoreError, CoreResult};
use crate::ids::{AuthorizationId, OrgId, PlatformId, RecordId, UserId};
use crate::permission::{Permission, ResourceType};
use crate::traits::{IndexEntry, Record};

/// Secondary index bucket mapping token values to authorization IDs.
pub const TOKEN_INDEX_BUCKET: &[u8] = b"authorizationindexv1";

/// Whether an authorization may currently be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationStatus {
    #[default]
    Active,
    Inactive,
}

impl AuthorizationStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl FromStr for AuthorizationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("invalid authorization status: {s}")),
        }
    }
}

/// A bearer token together with the grants it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    #[serde(default)]
    pub id: AuthorizationId,
    #[serde(rename = "orgID")]
    pub org_id: OrgId,
    /// Zero until resolved from the caller on create.
    #[serde(rename = "userID", default)]
    pub user_id: UserId,
    /// Generated once on create and never changed afterwards.
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub status: AuthorizationStatus,
    #[serde(default)]
    pub description: String,
    pub permissions: Vec<Permission>,
    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Authorization {
    /// Creates an unsaved authorization; ID, token and user are filled in on create.
    #[must_use]
    pub fn new(org_id: OrgId, permissions: Vec<Permission>) -> Self {
        let now = Utc::now();
        Self {
            id: AuthorizationId::default(),
            org_id,
            user_id: UserId::default(),
            token: String::new(),
            status: AuthorizationStatus::Active,
            description: String::new(),
            permissions,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Authorizer for Authorization {
    fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    fn identifier(&self) -> PlatformId {
        self.id.into()
    }

    fn user_id(&self) -> UserId {
        self.user_id
    }

    fn kind(&self) -> &'static str {
        "authorization"
    }

    fn is_active(&self) -> bool {
        self.status == AuthorizationStatus::Active
    }
}

/// Equality predicates over [`Authorization`] fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationFilter {
    pub id: Option<AuthorizationId>,
    pub org_id: Option<OrgId>,
    pub user_id: Option<UserId>,
    pub token: Option<String>,
}

/// Mutable fields of an authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationUpdate {
    #[serde(default)]
    pub status: Option<AuthorizationStatus>,
    #[serde(default)]
    pub description: Option<String>,
}

impl AuthorizationUpdate {
    /// Overwrites the fields that are set; the service stamps `updated_at`.
    pub fn apply(&self, auth: &mut Authorization) {
        if let Some(status) = self.status {
            auth.status = status;
        }
        if let Some(description) = &self.description {
            auth.description.clone_from(description);
        }
    }
}

impl Record for Authorization {
    type Id = AuthorizationId;
    type Filter = AuthorizationFilter;

    const ENTITY: &'static str = "authorization";
    const BUCKET: &'static [u8] = b"authorizationsv1";
    const INDEX_BUCKETS: &'static [&'static [u8]] = &[TOKEN_INDEX_BUCKET];
    const RESOURCE: ResourceType = ResourceType::Authorizations;

    fn id(&self) -> AuthorizationId {
        self.id
    }

    fn set_id(&mut self, id: AuthorizationId) {
        self.id = id;
    }

    fn org_id(&self) -> OrgId {
        self.org_id
    }

    fn filter_org_id(filter: &AuthorizationFilter) -> Option<OrgId> {
        filter.org_id
    }

    fn matches(&self, filter: &AuthorizationFilter) -> bool {
        filter.id.map_or(true, |id| id == self.id)
            && filter.org_id.map_or(true, |org| org == self.org_id)
            && filter.user_id.map_or(true, |user| user == self.user_id)
            && filter.token.as_ref().map_or(true, |t| *t == self.token)
    }

    fn validate(&self) -> CoreResult<()> {
        if !self.org_id.is_valid() {
            return Err(CoreError::invalid("authorization must belong to an organization"));
        }
        if !self.user_id.is_valid() {
            return Err(CoreError::invalid("authorization must belong to a user"));
        }
        if self.token.is_empty() {
            return Err(CoreError::invalid("authorization token is empty"));
        }
        if self.permissions.is_empty() {
            return Err(CoreError::invalid(
                "authorization must include at least one permission",
            ));
        }
        Ok(())
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        vec![IndexEntry {
            bucket: TOKEN_INDEX_BUCKET,
            key: self.token.as_bytes().to_vec(),
        }]
    }
}
