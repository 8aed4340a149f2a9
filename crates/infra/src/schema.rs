//! Database schema bootstrap.

use sqlx::PgPool;
use tracing::instrument;

use crate::{StoreError, map_sqlx_error};

/// Idempotent DDL for every table the Postgres adapters use.
pub const SCHEMA: &str = include_str!("../migrations/0001_init.sql");

#[instrument(skip(pool), err)]
pub async fn init_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("init_schema", e))?;
    tracing::info!("database schema ready");
    Ok(())
}
