//! Audited CRUD over one resource type.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::instrument;

use jarvis_activity::{Action, Audited, Auditor, NewActivity, RequestMeta};
use jarvis_core::{DomainError, EntityId, TenantContext, UserId};
use jarvis_followups::{Followup, FollowupPatch, agenda};
use jarvis_query::{ListOptions, ListQuery, Page, Pagination, Resource};

use super::{References, ServiceError};
use crate::ResourceStore;

/// One rejected item of a bulk import.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkImportError {
    /// Position in the submitted batch, zero-based.
    pub index: usize,
    pub data: JsonValue,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkImportReport<R> {
    pub success: u64,
    pub failed: u64,
    pub results: Vec<R>,
    pub errors: Vec<BulkImportError>,
}

/// Create/read/update/delete for one resource, scoped by the caller's
/// [`TenantContext`].
///
/// Every successful mutation records an activity afterwards; a failed
/// activity write comes back in [`Audited::audit`] and never undoes the
/// mutation.
pub struct ResourceService<R: Resource> {
    store: Arc<dyn ResourceStore<R>>,
    auditor: Auditor,
    references: References,
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            auditor: self.auditor.clone(),
            references: self.references.clone(),
        }
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(store: Arc<dyn ResourceStore<R>>, auditor: Auditor, references: References) -> Self {
        Self {
            store,
            auditor,
            references,
        }
    }

    async fn insert_new(
        &self,
        ctx: &TenantContext,
        actor: UserId,
        new: R::New,
        now: DateTime<Utc>,
    ) -> Result<R, ServiceError> {
        R::validate_new(&new)?;
        self.references.check(ctx, &R::references_of_new(&new)).await?;
        let row = R::create(EntityId::new(), ctx, actor, now, new);
        Ok(self.store.insert(ctx, row).await?)
    }

    #[instrument(skip_all, fields(tenant_id = %ctx.tenant_id(), entity = %R::ENTITY), err)]
    pub async fn create(
        &self,
        ctx: &TenantContext,
        actor: UserId,
        meta: RequestMeta,
        new: R::New,
    ) -> Result<Audited<R>, ServiceError> {
        let row = self.insert_new(ctx, actor, new, Utc::now()).await?;
        Ok(self.auditor.created(ctx, actor, meta, row).await)
    }

    pub async fn find(&self, ctx: &TenantContext, id: EntityId) -> Result<R, ServiceError> {
        self.store
            .find_by_id(ctx, id)
            .await?
            .ok_or_else(ServiceError::not_found)
    }

    pub async fn list(&self, ctx: &TenantContext, filter: &R::Filter) -> Result<Page<R>, ServiceError> {
        self.run(ctx, &filter.to_query(ctx)).await
    }

    /// Runs a prebuilt query; it must have been built under `ctx`.
    pub async fn run(&self, ctx: &TenantContext, query: &ListQuery) -> Result<Page<R>, ServiceError> {
        Ok(self.store.list(ctx, query).await?)
    }

    #[instrument(skip_all, fields(tenant_id = %ctx.tenant_id(), entity = %R::ENTITY, id = %id), err)]
    pub async fn update(
        &self,
        ctx: &TenantContext,
        actor: UserId,
        meta: RequestMeta,
        id: EntityId,
        patch: R::Patch,
    ) -> Result<Audited<R>, ServiceError> {
        let now = Utc::now();
        R::validate_patch(&patch)?;
        let updated_fields: Vec<String> = R::changes(&patch, now)
            .into_iter()
            .map(|(column, _)| column.to_string())
            .collect();
        if updated_fields.is_empty() {
            return Err(DomainError::validation("no updatable fields supplied").into());
        }
        self.references.check(ctx, &R::references_of_patch(&patch)).await?;

        let row = self
            .store
            .update(ctx, id, &patch, now)
            .await?
            .ok_or_else(ServiceError::not_found)?;
        Ok(self.auditor.updated(ctx, actor, meta, row, updated_fields).await)
    }

    #[instrument(skip_all, fields(tenant_id = %ctx.tenant_id(), entity = %R::ENTITY, id = %id), err)]
    pub async fn delete(
        &self,
        ctx: &TenantContext,
        actor: UserId,
        meta: RequestMeta,
        id: EntityId,
    ) -> Result<Audited<R::Summary>, ServiceError> {
        let row = self
            .store
            .soft_delete(ctx, id, Utc::now())
            .await?
            .ok_or_else(ServiceError::not_found)?;
        Ok(self.auditor.deleted(ctx, actor, meta, &row).await)
    }

    /// Creates each record independently; one bad record never fails the
    /// others. Records a single `bulk_import` activity for the batch.
    #[instrument(skip_all, fields(tenant_id = %ctx.tenant_id(), entity = %R::ENTITY, total = records.len()))]
    pub async fn bulk_import(
        &self,
        ctx: &TenantContext,
        actor: UserId,
        meta: RequestMeta,
        records: Vec<JsonValue>,
    ) -> Audited<BulkImportReport<R>> {
        let total = records.len() as u64;
        let mut results = Vec::new();
        let mut errors = Vec::new();

        for (index, data) in records.into_iter().enumerate() {
            let outcome = match serde_json::from_value::<R::New>(data.clone()) {
                Ok(new) => self.insert_new(ctx, actor, new, Utc::now()).await,
                Err(e) => Err(DomainError::validation(e.to_string()).into()),
            };
            match outcome {
                Ok(row) => results.push(row),
                Err(err) => {
                    tracing::debug!(index, error = %err, "bulk import record rejected");
                    errors.push(BulkImportError {
                        index,
                        data,
                        error: err.public_message(),
                    })
                }
            }
        }

        let report = BulkImportReport {
            success: results.len() as u64,
            failed: errors.len() as u64,
            results,
            errors,
        };
        tracing::info!(success = report.success, failed = report.failed, "bulk import finished");

        let activity = NewActivity::new(
            R::ENTITY,
            Action::BulkImport {
                total,
                success: report.success,
                failed: report.failed,
            },
        )
        .by(actor)
        .with_meta(meta);
        self.auditor.attach(ctx, report, activity).await
    }
}

impl ResourceService<Followup> {
    /// Marks the follow-up completed and stamps `completed_at`.
    #[instrument(skip_all, fields(tenant_id = %ctx.tenant_id(), id = %id), err)]
    pub async fn complete(
        &self,
        ctx: &TenantContext,
        actor: UserId,
        meta: RequestMeta,
        id: EntityId,
        result: Option<String>,
    ) -> Result<Audited<Followup>, ServiceError> {
        let patch = FollowupPatch::completion(result.clone());
        let row = self
            .store
            .update(ctx, id, &patch, Utc::now())
            .await?
            .ok_or_else(ServiceError::not_found)?;

        let activity = NewActivity::new(Followup::ENTITY, Action::Completed { result })
            .by(actor)
            .on(row.id)
            .with_meta(meta);
        Ok(self.auditor.attach(ctx, row, activity).await)
    }

    pub async fn today(
        &self,
        ctx: &TenantContext,
        assigned_to: Option<UserId>,
        page: Pagination,
    ) -> Result<Page<Followup>, ServiceError> {
        self.run(ctx, &agenda::today(ctx, assigned_to, page, Utc::now())).await
    }

    pub async fn overdue(
        &self,
        ctx: &TenantContext,
        assigned_to: Option<UserId>,
        page: Pagination,
    ) -> Result<Page<Followup>, ServiceError> {
        self.run(ctx, &agenda::overdue(ctx, assigned_to, page, Utc::now())).await
    }
}
