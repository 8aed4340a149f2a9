//! Postgres-backed resource store.
//!
//! Statements come from `jarvis_query::sql`; this module only binds their
//! parameters and maps rows back. Every statement carries `tenant_id` in its
//! WHERE clause (or, for inserts, in its values), so cross-tenant access is
//! not expressible here.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use tracing::instrument;

use jarvis_core::{EntityId, TenantContext};
use jarvis_query::sql::{exists_sql, find_by_id_sql, insert_sql, soft_delete_sql, update_sql};
use jarvis_query::{ListQuery, Page, Resource, SqlValue, Statement};

use super::{ResourceStore, check_scope};
use crate::{StoreError, map_sqlx_error};

/// A resource that can be read back from a Postgres row.
pub trait PgRecord: Resource {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error>;
}

pub(crate) fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Bool(v) => query.bind(v),
        SqlValue::Int(v) => query.bind(v),
        SqlValue::Float(v) => query.bind(v),
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Uuid(v) => query.bind(v),
        SqlValue::Timestamp(v) => query.bind(v),
        SqlValue::TextArray(v) => query.bind(v),
        SqlValue::Json(v) => query.bind(sqlx::types::Json(v)),
    }
}

pub(crate) fn prepare(statement: &Statement) -> Query<'_, Postgres, PgArguments> {
    statement
        .params
        .iter()
        .cloned()
        .fold(sqlx::query(&statement.sql), bind_value)
}

#[derive(Debug)]
pub struct PgStore<R> {
    pool: Arc<PgPool>,
    _row: PhantomData<fn() -> R>,
}

impl<R> Clone for PgStore<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _row: PhantomData,
        }
    }
}

impl<R: PgRecord> PgStore<R> {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            _row: PhantomData,
        }
    }

    async fn fetch_one_opt(&self, operation: &str, statement: Statement) -> Result<Option<R>, StoreError> {
        let row = prepare(&statement)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        row.as_ref()
            .map(R::from_row)
            .transpose()
            .map_err(|e| map_sqlx_error(operation, e))
    }
}

#[async_trait]
impl<R: PgRecord> ResourceStore<R> for PgStore<R> {
    #[instrument(skip(self, ctx, row), fields(tenant_id = %ctx.tenant_id(), table = R::COLUMNS.table), err)]
    async fn insert(&self, ctx: &TenantContext, row: R) -> Result<R, StoreError> {
        let values = R::INSERT_COLUMNS
            .iter()
            .map(|column| (*column, row.column(column)))
            .collect();
        let statement = insert_sql(R::COLUMNS, ctx, row.id(), values);
        self.fetch_one_opt("insert", statement)
            .await?
            .ok_or_else(|| StoreError::Backend("insert returned no row".to_string()))
    }

    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id(), table = R::COLUMNS.table), err)]
    async fn find_by_id(&self, ctx: &TenantContext, id: EntityId) -> Result<Option<R>, StoreError> {
        self.fetch_one_opt("find_by_id", find_by_id_sql(R::COLUMNS, ctx, id)).await
    }

    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id(), table = R::COLUMNS.table), err)]
    async fn exists(&self, ctx: &TenantContext, id: EntityId) -> Result<bool, StoreError> {
        let statement = exists_sql(R::COLUMNS, ctx, id);
        let row = prepare(&statement)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("exists", e))?;
        row.try_get::<bool, _>(0).map_err(|e| map_sqlx_error("exists", e))
    }

    #[instrument(skip(self, ctx, query), fields(tenant_id = %ctx.tenant_id(), table = R::COLUMNS.table), err)]
    async fn list(&self, ctx: &TenantContext, query: &ListQuery) -> Result<Page<R>, StoreError> {
        check_scope(ctx, query)?;

        let count = query.count_sql();
        let total: i64 = prepare(&count)
            .fetch_one(&*self.pool)
            .await
            .and_then(|row| row.try_get(0))
            .map_err(|e| map_sqlx_error("list_count", e))?;

        let select = query.select_sql();
        let rows = prepare(&select)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;
        let data = rows
            .iter()
            .map(R::from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("list", e))?;

        let page = query.page();
        Ok(Page {
            data,
            total: total.max(0) as u64,
            limit: page.limit,
            offset: page.offset,
        })
    }

    #[instrument(skip(self, ctx, patch), fields(tenant_id = %ctx.tenant_id(), table = R::COLUMNS.table), err)]
    async fn update(
        &self,
        ctx: &TenantContext,
        id: EntityId,
        patch: &R::Patch,
        now: DateTime<Utc>,
    ) -> Result<Option<R>, StoreError> {
        match update_sql(R::COLUMNS, ctx, id, R::changes(patch, now), now) {
            Some(statement) => self.fetch_one_opt("update", statement).await,
            None => Ok(None),
        }
    }

    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id(), table = R::COLUMNS.table), err)]
    async fn soft_delete(&self, ctx: &TenantContext, id: EntityId, at: DateTime<Utc>) -> Result<Option<R>, StoreError> {
        self.fetch_one_opt("soft_delete", soft_delete_sql(R::COLUMNS, ctx, id, at)).await
    }
}
