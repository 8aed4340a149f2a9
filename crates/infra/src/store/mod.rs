//! Generic tenant-scoped resource storage.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use jarvis_core::{EntityId, TenantContext};
use jarvis_query::{ListQuery, Page, Resource};

use crate::StoreError;

pub mod memory;
pub mod postgres;
pub(crate) mod rows;

pub use memory::MemoryStore;
pub use postgres::{PgRecord, PgStore};

/// Tenant-scoped CRUD over one resource type.
///
/// Every method takes the context; none reaches a row outside its tenant or
/// a soft-deleted row.
#[async_trait]
pub trait ResourceStore<R: Resource>: Send + Sync {
    async fn insert(&self, ctx: &TenantContext, row: R) -> Result<R, StoreError>;

    async fn find_by_id(&self, ctx: &TenantContext, id: EntityId) -> Result<Option<R>, StoreError>;

    async fn exists(&self, ctx: &TenantContext, id: EntityId) -> Result<bool, StoreError>;

    async fn list(&self, ctx: &TenantContext, query: &ListQuery) -> Result<Page<R>, StoreError>;

    /// `None` when the row is not visible or the patch changes nothing.
    async fn update(
        &self,
        ctx: &TenantContext,
        id: EntityId,
        patch: &R::Patch,
        now: DateTime<Utc>,
    ) -> Result<Option<R>, StoreError>;

    /// Stamps `deleted_at`; returns the row as it was deleted, or `None` when
    /// absent or already deleted.
    async fn soft_delete(&self, ctx: &TenantContext, id: EntityId, at: DateTime<Utc>) -> Result<Option<R>, StoreError>;
}

#[async_trait]
impl<R, S> ResourceStore<R> for Arc<S>
where
    R: Resource,
    S: ResourceStore<R> + ?Sized,
{
    async fn insert(&self, ctx: &TenantContext, row: R) -> Result<R, StoreError> {
        (**self).insert(ctx, row).await
    }

    async fn find_by_id(&self, ctx: &TenantContext, id: EntityId) -> Result<Option<R>, StoreError> {
        (**self).find_by_id(ctx, id).await
    }

    async fn exists(&self, ctx: &TenantContext, id: EntityId) -> Result<bool, StoreError> {
        (**self).exists(ctx, id).await
    }

    async fn list(&self, ctx: &TenantContext, query: &ListQuery) -> Result<Page<R>, StoreError> {
        (**self).list(ctx, query).await
    }

    async fn update(
        &self,
        ctx: &TenantContext,
        id: EntityId,
        patch: &R::Patch,
        now: DateTime<Utc>,
    ) -> Result<Option<R>, StoreError> {
        (**self).update(ctx, id, patch, now).await
    }

    async fn soft_delete(&self, ctx: &TenantContext, id: EntityId, at: DateTime<Utc>) -> Result<Option<R>, StoreError> {
        (**self).soft_delete(ctx, id, at).await
    }
}

/// A list query must have been built under the same context it runs in.
pub(crate) fn check_scope(ctx: &TenantContext, query: &ListQuery) -> Result<(), StoreError> {
    if ctx.admits(query.tenant_id()) {
        Ok(())
    } else {
        tracing::error!(
            tenant_id = %ctx.tenant_id(),
            query_tenant = %query.tenant_id(),
            "list query built for a different tenant"
        );
        Err(StoreError::TenantIsolation(format!("query scoped to {}", query.tenant_id())))
    }
}
