use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ids::{OrgId, UserId};

/// Organization owning buckets, mappings and tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
}

impl Organization {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: OrgId::new(),
            name: name.into(),
        }
    }
}

/// User status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// User is active and can own tokens.
    #[default]
    Active,
    /// User is deactivated.
    Inactive,
}

impl UserStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("invalid user status: {s}")),
        }
    }
}

/// A user that tokens can be issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub status: UserStatus,
}

impl User {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            status: UserStatus::Active,
        }
    }
}
