//! In-memory activity log for tests/dev.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use jarvis_core::{ActivityId, EntityId, EntityType, TenantContext, UserId};
use jarvis_query::Pagination;

use crate::{ActivityLog, ActivityRecord, AuditError, NewActivity};

#[derive(Debug, Default)]
pub struct InMemoryActivityLog {
    records: RwLock<Vec<ActivityRecord>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_first<F>(&self, page: Pagination, keep: F) -> Result<Vec<ActivityRecord>, AuditError>
    where
        F: Fn(&ActivityRecord) -> bool,
    {
        let records = self
            .records
            .read()
            .map_err(|_| AuditError::Backend("lock poisoned".to_string()))?;

        Ok(records
            .iter()
            .rev()
            .filter(|r| keep(r))
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ActivityLog for InMemoryActivityLog {
    async fn append(&self, ctx: &TenantContext, activity: NewActivity) -> Result<ActivityRecord, AuditError> {
        let record = activity.into_record(ActivityId::new(), ctx.tenant_id(), Utc::now());
        let mut records = self
            .records
            .write()
            .map_err(|_| AuditError::Backend("lock poisoned".to_string()))?;
        records.push(record.clone());
        Ok(record)
    }

    async fn recent(
        &self,
        ctx: &TenantContext,
        page: Pagination,
        actor: Option<UserId>,
    ) -> Result<Vec<ActivityRecord>, AuditError> {
        self.newest_first(page, |r| {
            ctx.admits(r.tenant_id) && actor.is_none_or(|a| r.actor_id == Some(a))
        })
    }

    async fn by_entity(
        &self,
        ctx: &TenantContext,
        entity_type: EntityType,
        entity_id: EntityId,
        page: Pagination,
    ) -> Result<Vec<ActivityRecord>, AuditError> {
        self.newest_first(page, |r| {
            ctx.admits(r.tenant_id) && r.entity_type == entity_type && r.entity_id == Some(entity_id)
        })
    }

    async fn count(&self, ctx: &TenantContext) -> Result<u64, AuditError> {
        let records = self
            .records
            .read()
            .map_err(|_| AuditError::Backend("lock poisoned".to_string()))?;
        Ok(records.iter().filter(|r| ctx.admits(r.tenant_id)).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use jarvis_core::TenantId;

    use super::*;
    use crate::Action;

    fn login(email: &str) -> Action {
        Action::Login { email: email.to_string() }
    }

    #[tokio::test]
    async fn reads_are_tenant_scoped_and_newest_first() {
        let log = InMemoryActivityLog::new();
        let a = TenantContext::new(TenantId::new());
        let b = TenantContext::new(TenantId::new());
        let user = UserId::new();

        for email in ["one@a.io", "two@a.io"] {
            log.append(&a, NewActivity::new(EntityType::User, login(email)).by(user).on(user))
                .await
                .unwrap();
        }
        log.append(&b, NewActivity::new(EntityType::User, login("x@b.io")))
            .await
            .unwrap();

        let recent = log.recent(&a, Pagination::default(), None).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, login("two@a.io"));
        assert_eq!(log.count(&a).await.unwrap(), 2);

        let mine = log.recent(&a, Pagination::default(), Some(UserId::new())).await.unwrap();
        assert!(mine.is_empty());

        let history = log
            .by_entity(&b, EntityType::User, user.into(), Pagination::default())
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn count_only_grows() {
        let log = InMemoryActivityLog::new();
        let ctx = TenantContext::new(TenantId::new());
        let mut last = 0;
        for i in 0..5 {
            log.append(&ctx, NewActivity::new(EntityType::Tenant, login(&format!("{i}@a.io"))))
                .await
                .unwrap();
            let now = log.count(&ctx).await.unwrap();
            assert!(now > last);
            last = now;
        }
    }
}
