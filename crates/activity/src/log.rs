use async_trait::async_trait;
use thiserror::Error;

use jarvis_core::{EntityId, EntityType, TenantContext, UserId};
use jarvis_query::Pagination;

use crate::{ActivityRecord, NewActivity};

/// Default page size of the recency feed.
pub const RECENT_DEFAULT_LIMIT: i64 = 20;

/// A failure to write or read the audit trail.
///
/// Kept apart from the business error types: an audit failure never turns a
/// committed mutation into a failed one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("audit details could not be encoded: {0}")]
    Encoding(String),

    #[error("audit backend failure: {0}")]
    Backend(String),
}

/// Append-only store of activity records.
///
/// Every method takes the tenant context; reads never return another
/// tenant's records. Results are newest first.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn append(&self, ctx: &TenantContext, activity: NewActivity) -> Result<ActivityRecord, AuditError>;

    async fn recent(
        &self,
        ctx: &TenantContext,
        page: Pagination,
        actor: Option<UserId>,
    ) -> Result<Vec<ActivityRecord>, AuditError>;

    async fn by_entity(
        &self,
        ctx: &TenantContext,
        entity_type: EntityType,
        entity_id: EntityId,
        page: Pagination,
    ) -> Result<Vec<ActivityRecord>, AuditError>;

    async fn count(&self, ctx: &TenantContext) -> Result<u64, AuditError>;
}
