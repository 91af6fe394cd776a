use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::ids::{BucketId, MappingId, OrgId};
use crate::permission::ResourceType;
use crate::traits::Record;

/// Maps a legacy database/retention-policy pair onto a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbrpMapping {
    /// Zero until the service assigns one.
    #[serde(default)]
    pub id: MappingId,
    #[serde(default)]
    pub cluster: String,
    pub database: String,
    pub retention_policy: String,
    /// Whether this retention policy is the default for its database.
    #[serde(default)]
    pub default: bool,
    pub organization_id: OrgId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_id: Option<BucketId>,
}

impl DbrpMapping {
    /// Creates an unsaved mapping; the ID is assigned on create.
    #[must_use]
    pub fn new(
        organization_id: OrgId,
        database: impl Into<String>,
        retention_policy: impl Into<String>,
    ) -> Self {
        Self {
            id: MappingId::default(),
            cluster: String::new(),
            database: database.into(),
            retention_policy: retention_policy.into(),
            default: false,
            organization_id,
            bucket_id: None,
        }
    }
}

/// Conjunction of optional equality predicates over [`DbrpMapping`] fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbrpMappingFilter {
    pub id: Option<MappingId>,
    pub org_id: Option<OrgId>,
    pub bucket_id: Option<BucketId>,
    pub cluster: Option<String>,
    pub database: Option<String>,
    pub retention_policy: Option<String>,
    pub default: Option<bool>,
}

impl DbrpMappingFilter {
    /// Filter scoped to one organization.
    #[must_use]
    pub fn for_org(org_id: OrgId) -> Self {
        Self {
            org_id: Some(org_id),
            ..Self::default()
        }
    }
}

fn eq_if_set<T: PartialEq>(want: Option<&T>, have: &T) -> bool {
    want.map_or(true, |w| w == have)
}

impl Record for DbrpMapping {
    type Id = MappingId;
    type Filter = DbrpMappingFilter;

    const ENTITY: &'static str = "dbrp mapping";
    const BUCKET: &'static [u8] = b"dbrpv1";
    const RESOURCE: ResourceType = ResourceType::Dbrp;

    fn id(&self) -> MappingId {
        self.id
    }

    fn set_id(&mut self, id: MappingId) {
        self.id = id;
    }

    fn org_id(&self) -> OrgId {
        self.organization_id
    }

    fn filter_org_id(filter: &DbrpMappingFilter) -> Option<OrgId> {
        filter.org_id
    }

    fn matches(&self, filter: &DbrpMappingFilter) -> bool {
        eq_if_set(filter.id.as_ref(), &self.id)
            && eq_if_set(filter.org_id.as_ref(), &self.organization_id)
            && (filter.bucket_id.is_none() || filter.bucket_id == self.bucket_id)
            && eq_if_set(filter.cluster.as_ref(), &self.cluster)
            && eq_if_set(filter.database.as_ref(), &self.database)
            && eq_if_set(filter.retention_policy.as_ref(), &self.retention_policy)
            && eq_if_set(filter.default.as_ref(), &self.default)
    }

    fn validate(&self) -> CoreResult<()> {
        if self.database.is_empty() {
            return Err(CoreError::invalid("database name is required"));
        }
        if self.retention_policy.is_empty() {
            return Err(CoreError::invalid("retention policy name is required"));
        }
        Ok(())
    }
}
