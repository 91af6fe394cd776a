//! Resource-action grants used by authorization checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::{OrgId, PlatformId};

/// Actions that can be performed on resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
}

impl Action {
    /// Convert action to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Action::Read),
            "write" => Ok(Action::Write),
            _ => Err(format!("invalid action: {s}")),
        }
    }
}

/// Kinds of resources a permission can be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Authorizations,
    Buckets,
    Dbrp,
    Orgs,
    Users,
}

impl ResourceType {
    /// Every resource type, in a stable order.
    pub const ALL: [ResourceType; 5] = [
        ResourceType::Authorizations,
        ResourceType::Buckets,
        ResourceType::Dbrp,
        ResourceType::Orgs,
        ResourceType::Users,
    ];

    /// Convert resource type to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Authorizations => "authorizations",
            ResourceType::Buckets => "buckets",
            ResourceType::Dbrp => "dbrp",
            ResourceType::Orgs => "orgs",
            ResourceType::Users => "users",
        }
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|rt| rt.as_str() == s)
            .ok_or_else(|| format!("invalid resource type: {s}"))
    }
}

/// A resource, optionally narrowed to one organization and/or one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PlatformId>,
    #[serde(rename = "orgID", default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<OrgId>,
}

impl Resource {
    /// Every resource of a kind, across all organizations.
    #[must_use]
    pub const fn all(kind: ResourceType) -> Self {
        Self {
            kind,
            id: None,
            org_id: None,
        }
    }

    /// Every resource of a kind inside one organization.
    #[must_use]
    pub const fn in_org(kind: ResourceType, org_id: OrgId) -> Self {
        Self {
            kind,
            id: None,
            org_id: Some(org_id),
        }
    }

    /// A single resource instance.
    #[must_use]
    pub fn instance(kind: ResourceType, id: impl Into<PlatformId>, org_id: Option<OrgId>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
            org_id,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(org_id) = self.org_id {
            write!(f, "orgs/{org_id}/")?;
        }
        f.write_str(self.kind.as_str())?;
        if let Some(id) = self.id {
            write!(f, "/{id}")?;
        }
        Ok(())
    }
}

/// Grant of one action on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub action: Action,
    pub resource: Resource,
}

impl Permission {
    #[must_use]
    pub const fn new(action: Action, resource: Resource) -> Self {
        Self { action, resource }
    }

    /// Returns `true` when holding `self` allows `requested`.
    ///
    /// An unscoped grant covers every instance of the type; an org-scoped grant
    /// covers any request inside that organization; an instance grant covers
    /// only requests naming the same instance.
    #[must_use]
    pub fn matches(&self, requested: &Permission) -> bool {
        if self.action != requested.action || self.resource.kind != requested.resource.kind {
            return false;
        }

        match (self.resource.org_id, self.resource.id) {
            (None, None) => true,
            (Some(org_id), None) => requested.resource.org_id == Some(org_id),
            (_, Some(id)) => requested.resource.id == Some(id),
        }
    }

    /// Read and write on every resource type, unscoped.
    #[must_use]
    pub fn operator_permissions() -> Vec<Permission> {
        ResourceType::ALL
            .into_iter()
            .flat_map(|kind| {
                [
                    Permission::new(Action::Read, Resource::all(kind)),
                    Permission::new(Action::Write, Resource::all(kind)),
                ]
            })
            .collect()
    }

    /// Read and write on every resource type inside one organization.
    #[must_use]
    pub fn owner_permissions(org_id: OrgId) -> Vec<Permission> {
        ResourceType::ALL
            .into_iter()
            .flat_map(|kind| {
                [
                    Permission::new(Action::Read, Resource::in_org(kind, org_id)),
                    Permission::new(Action::Write, Resource::in_org(kind, org_id)),
                ]
            })
            .collect()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action.as_str(), self.resource)
    }
}
