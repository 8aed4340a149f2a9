//! Postgres-backed activity log.
//!
//! Insert and select only; there is no statement in this module that updates
//! or deletes an activity row.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use jarvis_activity::{Action, ActivityLog, ActivityRecord, AuditError, NewActivity};
use jarvis_core::{ActivityId, EntityId, EntityType, TenantContext, UserId};
use jarvis_query::Pagination;

use crate::store::rows::{opt_entity_id, opt_user_id, parse, tenant_id};

#[derive(Debug, Clone)]
pub struct PgActivityLog {
    pool: Arc<PgPool>,
}

impl PgActivityLog {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn backend(operation: &str, err: sqlx::Error) -> AuditError {
    AuditError::Backend(format!("{operation}: {err}"))
}

fn record_from_row(row: &PgRow) -> Result<ActivityRecord, AuditError> {
    let decode = |e: sqlx::Error| AuditError::Backend(format!("decode activity: {e}"));
    let kind: String = row.try_get("action").map_err(decode)?;
    let details: serde_json::Value = row.try_get("details").map_err(decode)?;
    let action = Action::from_parts(&kind, details).map_err(|e| AuditError::Encoding(e.to_string()))?;

    Ok(ActivityRecord {
        id: ActivityId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        tenant_id: tenant_id(row).map_err(decode)?,
        actor_id: opt_user_id(row, "user_id").map_err(decode)?,
        entity_type: parse::<EntityType>(row, "entity_type").map_err(decode)?,
        entity_id: opt_entity_id(row, "entity_id").map_err(decode)?,
        action,
        ip_address: row.try_get("ip_address").map_err(decode)?,
        user_agent: row.try_get("user_agent").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

#[async_trait]
impl ActivityLog for PgActivityLog {
    #[instrument(skip(self, ctx, activity), fields(tenant_id = %ctx.tenant_id(), action = activity.action.kind()), err)]
    async fn append(&self, ctx: &TenantContext, activity: NewActivity) -> Result<ActivityRecord, AuditError> {
        let (kind, details) = activity
            .action
            .to_parts()
            .map_err(|e| AuditError::Encoding(e.to_string()))?;
        let record = activity.into_record(ActivityId::new(), ctx.tenant_id(), Utc::now());

        sqlx::query(
            r#"
            INSERT INTO activities (
                id, tenant_id, user_id, entity_type, entity_id,
                action, details, ip_address, user_agent, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(ctx.tenant_id().as_uuid())
        .bind(record.actor_id.map(Uuid::from))
        .bind(record.entity_type.as_str())
        .bind(record.entity_id.map(Uuid::from))
        .bind(kind)
        .bind(sqlx::types::Json(details))
        .bind(record.ip_address.as_deref())
        .bind(record.user_agent.as_deref())
        .bind(record.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| backend("append", e))?;

        Ok(record)
    }

    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id()), err)]
    async fn recent(
        &self,
        ctx: &TenantContext,
        page: Pagination,
        actor: Option<UserId>,
    ) -> Result<Vec<ActivityRecord>, AuditError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM activities
            WHERE tenant_id = $1 AND ($2::uuid IS NULL OR user_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(ctx.tenant_id().as_uuid())
        .bind(actor.map(Uuid::from))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| backend("recent", e))?;

        rows.iter().map(record_from_row).collect()
    }

    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id()), err)]
    async fn by_entity(
        &self,
        ctx: &TenantContext,
        entity_type: EntityType,
        entity_id: EntityId,
        page: Pagination,
    ) -> Result<Vec<ActivityRecord>, AuditError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM activities
            WHERE tenant_id = $1 AND entity_type = $2 AND entity_id = $3
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(ctx.tenant_id().as_uuid())
        .bind(entity_type.as_str())
        .bind(entity_id.as_uuid())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| backend("by_entity", e))?;

        rows.iter().map(record_from_row).collect()
    }

    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id()), err)]
    async fn count(&self, ctx: &TenantContext) -> Result<u64, AuditError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activities WHERE tenant_id = $1")
            .bind(ctx.tenant_id().as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| backend("count", e))?;
        Ok(count.max(0) as u64)
    }
}
