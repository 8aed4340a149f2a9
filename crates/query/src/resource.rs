//! The generic tenant-scoped resource abstraction.
//!
//! Every collection (clients, proposals, followups, products) implements
//! [`Resource`]; storage adapters are written once against it, so the
//! isolation discipline lives in one place instead of per resource.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use jarvis_core::{DomainResult, EntityId, EntityType, TenantContext, TenantId, UserId};

use crate::{ColumnSet, ListQuery, SqlValue};

/// A row that can be filtered and ordered by column name.
pub trait Record {
    fn id(&self) -> EntityId;
    fn tenant_id(&self) -> TenantId;
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Current value of `name`. Unknown columns read as a NULL.
    fn column(&self, name: &str) -> SqlValue;
}

/// Another tenant-scoped row a write points at.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Reference {
    pub entity: EntityType,
    pub id: EntityId,
}

impl Reference {
    pub fn new(entity: EntityType, id: impl Into<EntityId>) -> Self {
        Self {
            entity,
            id: id.into(),
        }
    }
}

/// Turns a resource's recognised list options into a [`ListQuery`].
pub trait ListOptions {
    fn to_query(&self, ctx: &TenantContext) -> ListQuery;
}

pub trait Resource: Record + Clone + Serialize + Send + Sync + 'static {
    const ENTITY: EntityType;
    const COLUMNS: &'static ColumnSet;
    /// Columns written on insert besides `id` and `tenant_id`.
    const INSERT_COLUMNS: &'static [&'static str];

    type New: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Patch: DeserializeOwned + Send + Sync + 'static;
    type Filter: ListOptions + DeserializeOwned + Send + Sync + 'static;
    /// Minimal identifying tuple returned by a delete.
    type Summary: Serialize + Send + 'static;

    fn validate_new(_new: &Self::New) -> DomainResult<()> {
        Ok(())
    }

    fn validate_patch(_patch: &Self::Patch) -> DomainResult<()> {
        Ok(())
    }

    fn references_of_new(_new: &Self::New) -> Vec<Reference> {
        Vec::new()
    }

    fn references_of_patch(_patch: &Self::Patch) -> Vec<Reference> {
        Vec::new()
    }

    fn create(
        id: EntityId,
        ctx: &TenantContext,
        actor: UserId,
        now: DateTime<Utc>,
        new: Self::New,
    ) -> Self;

    /// Column/value pairs a patch writes, `updated_at` excluded. Empty means
    /// there is nothing to update.
    fn changes(patch: &Self::Patch, now: DateTime<Utc>) -> Vec<(&'static str, SqlValue)>;

    /// In-memory counterpart of [`Resource::changes`]; also stamps `updated_at`.
    fn apply(&mut self, patch: &Self::Patch, now: DateTime<Utc>);

    fn mark_deleted(&mut self, at: DateTime<Utc>);

    fn summary(&self) -> Self::Summary;

    /// Human-readable name recorded in the activity trail.
    fn display_name(&self) -> String;

    /// Secondary identifier recorded beside the name (a document number, a
    /// value), if the resource has one.
    fn reference(&self) -> Option<String> {
        None
    }
}

/// One page of a list read.
///
/// `total` counts every row matching the filter, not just this page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
