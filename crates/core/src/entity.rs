//! Entity kinds and the soft-delete lifecycle shared by tenant-scoped entities.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Kind of entity an activity record or repository row refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Client,
    Proposal,
    Followup,
    Product,
    User,
    Tenant,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Proposal => "proposal",
            Self::Followup => "followup",
            Self::Product => "product",
            Self::User => "user",
            Self::Tenant => "tenant",
        }
    }
}

impl core::fmt::Display for EntityType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "proposal" => Ok(Self::Proposal),
            "followup" => Ok(Self::Followup),
            "product" => Ok(Self::Product),
            "user" => Ok(Self::User),
            "tenant" => Ok(Self::Tenant),
            other => Err(DomainError::validation(format!("unknown entity type '{other}'"))),
        }
    }
}

/// Lifecycle state of a tenant-scoped row.
///
/// `Active -> Deleted` is one-way. There is no restore transition: a deleted
/// row stays in storage for history but is invisible to every default read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Deleted { at: DateTime<Utc> },
}

impl Lifecycle {
    pub fn from_deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(at) => Self::Deleted { at },
            None => Self::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Deleted { at } => Some(*at),
        }
    }

    /// Transition to `Deleted`. Returns `None` when the row is already deleted.
    pub fn delete(self, at: DateTime<Utc>) -> Option<Self> {
        match self {
            Self::Active => Some(Self::Deleted { at }),
            Self::Deleted { .. } => None,
        }
    }
}
