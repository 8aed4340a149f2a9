//! Fire-and-log recording on top of an [`ActivityLog`].

use std::sync::Arc;

use jarvis_core::{ActivityId, TenantContext, UserId};
use jarvis_query::Resource;

use crate::{Action, ActivityLog, AuditError, NewActivity, RequestMeta};

/// Result of a committed mutation plus the outcome of its audit write.
///
/// The mutation stands even when `audit` is an error.
#[derive(Debug)]
pub struct Audited<T> {
    pub value: T,
    pub audit: Result<ActivityId, AuditError>,
}

impl<T> Audited<T> {
    pub fn audit_failed(&self) -> bool {
        self.audit.is_err()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Audited<U> {
        Audited {
            value: f(self.value),
            audit: self.audit,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Records activities after successful writes.
///
/// A failed append is logged at `error` and returned beside the value; it
/// never unwinds the write that triggered it.
#[derive(Clone)]
pub struct Auditor {
    log: Arc<dyn ActivityLog>,
}

impl core::fmt::Debug for Auditor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Auditor").finish_non_exhaustive()
    }
}

impl Auditor {
    pub fn new(log: Arc<dyn ActivityLog>) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &Arc<dyn ActivityLog> {
        &self.log
    }

    pub async fn record(&self, ctx: &TenantContext, activity: NewActivity) -> Result<ActivityId, AuditError> {
        let entity_type = activity.entity_type;
        let entity_id = activity.entity_id;
        let action = activity.action.kind();

        match self.log.append(ctx, activity).await {
            Ok(record) => Ok(record.id),
            Err(err) => {
                tracing::error!(
                    tenant_id = %ctx.tenant_id(),
                    entity_type = %entity_type,
                    entity_id = ?entity_id,
                    action,
                    error = %err,
                    "audit write failed"
                );
                Err(err)
            }
        }
    }

    pub async fn attach<T>(&self, ctx: &TenantContext, value: T, activity: NewActivity) -> Audited<T> {
        let audit = self.record(ctx, activity).await;
        Audited { value, audit }
    }

    pub async fn created<R: Resource>(
        &self,
        ctx: &TenantContext,
        actor: UserId,
        meta: RequestMeta,
        row: R,
    ) -> Audited<R> {
        let activity = NewActivity::new(
            R::ENTITY,
            Action::Created {
                name: row.display_name(),
                reference: row.reference(),
            },
        )
        .by(actor)
        .on(row.id())
        .with_meta(meta);
        self.attach(ctx, row, activity).await
    }

    pub async fn updated<R: Resource>(
        &self,
        ctx: &TenantContext,
        actor: UserId,
        meta: RequestMeta,
        row: R,
        updated_fields: Vec<String>,
    ) -> Audited<R> {
        let activity = NewActivity::new(R::ENTITY, Action::Updated { updated_fields })
            .by(actor)
            .on(row.id())
            .with_meta(meta);
        self.attach(ctx, row, activity).await
    }

    pub async fn deleted<R: Resource>(
        &self,
        ctx: &TenantContext,
        actor: UserId,
        meta: RequestMeta,
        row: &R,
    ) -> Audited<R::Summary> {
        let activity = NewActivity::new(
            R::ENTITY,
            Action::Deleted {
                name: row.display_name(),
                reference: row.reference(),
            },
        )
        .by(actor)
        .on(row.id())
        .with_meta(meta);
        self.attach(ctx, row.summary(), activity).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use jarvis_core::{EntityId, EntityType, TenantId};
    use jarvis_query::Pagination;

    use super::*;
    use crate::{ActivityRecord, InMemoryActivityLog};

    struct BrokenLog;

    #[async_trait]
    impl ActivityLog for BrokenLog {
        async fn append(&self, _: &TenantContext, _: NewActivity) -> Result<ActivityRecord, AuditError> {
            Err(AuditError::Backend("disk full".into()))
        }
        async fn recent(
            &self,
            _: &TenantContext,
            _: Pagination,
            _: Option<UserId>,
        ) -> Result<Vec<ActivityRecord>, AuditError> {
            Ok(vec![])
        }
        async fn by_entity(
            &self,
            _: &TenantContext,
            _: EntityType,
            _: EntityId,
            _: Pagination,
        ) -> Result<Vec<ActivityRecord>, AuditError> {
            Ok(vec![])
        }
        async fn count(&self, _: &TenantContext) -> Result<u64, AuditError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn failed_append_is_reported_beside_the_value() {
        let auditor = Auditor::new(Arc::new(BrokenLog));
        let ctx = TenantContext::new(TenantId::new());

        let out = auditor
            .attach(&ctx, "committed", NewActivity::new(EntityType::Tenant, Action::Login { email: "a@b.c".into() }))
            .await;

        assert_eq!(out.value, "committed");
        assert_eq!(out.audit, Err(AuditError::Backend("disk full".into())));
    }

    #[tokio::test]
    async fn successful_append_returns_record_id() {
        let log = Arc::new(InMemoryActivityLog::new());
        let auditor = Auditor::new(log.clone());
        let ctx = TenantContext::new(TenantId::new());

        let out = auditor
            .attach(&ctx, (), NewActivity::new(EntityType::Tenant, Action::Login { email: "a@b.c".into() }))
            .await;

        assert!(!out.audit_failed());
        let recent = log.recent(&ctx, Pagination::default(), None).await.unwrap();
        assert_eq!(Ok(recent[0].id), out.audit);
    }
}
