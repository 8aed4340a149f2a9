//! Postgres-backed account store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use jarvis_auth::Role;
use jarvis_core::{TenantContext, TenantId, UserId};
use jarvis_query::{Page, Pagination};

use super::{AccountStore, Tenant, User, UserChange};
use crate::store::rows::tenant_id;
use crate::{StoreError, map_sqlx_error};

const USER_COLUMNS: &str = "id, tenant_id, name, email, password_hash, role, phone, active, \
                            last_login_at, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: Arc<PgPool>,
}

impl PgAccountStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn tenant_from_row(row: &PgRow) -> Result<Tenant, sqlx::Error> {
    Ok(Tenant {
        id: TenantId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        subdomain: row.try_get("subdomain")?,
        document: row.try_get("document")?,
        plan: row.try_get("plan")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        tenant_id: tenant_id(row)?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: Role::from(row.try_get::<String, _>("role")?),
        phone: row.try_get("phone")?,
        active: row.try_get("active")?,
        last_login_at: row.try_get("last_login_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn decode<T>(operation: &str, row: Result<T, sqlx::Error>) -> Result<T, StoreError> {
    row.map_err(|e| map_sqlx_error(operation, e))
}

#[async_trait]
impl AccountStore for PgAccountStore {
    #[instrument(skip(self, tenant), fields(subdomain = %tenant.subdomain), err)]
    async fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO tenants (id, name, subdomain, document, plan, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant.id.as_uuid())
        .bind(&tenant.name)
        .bind(&tenant.subdomain)
        .bind(&tenant.document)
        .bind(&tenant.plan)
        .bind(tenant.active)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_tenant", e))?;

        decode("insert_tenant", tenant_from_row(&row))
    }

    async fn tenant(&self, id: TenantId) -> Result<Option<Tenant>, StoreError> {
        let row = sqlx::query("SELECT * FROM tenants WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("tenant", e))?;

        row.map(|r| decode("tenant", tenant_from_row(&r))).transpose()
    }

    async fn tenant_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, StoreError> {
        let row = sqlx::query("SELECT * FROM tenants WHERE subdomain = $1")
            .bind(subdomain)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("tenant_by_subdomain", e))?;

        row.map(|r| decode("tenant_by_subdomain", tenant_from_row(&r)))
            .transpose()
    }

    #[instrument(skip(self, ctx, user), fields(tenant_id = %ctx.tenant_id()), err)]
    async fn insert_user(&self, ctx: &TenantContext, user: User) -> Result<User, StoreError> {
        if !ctx.admits(user.tenant_id) {
            return Err(StoreError::TenantIsolation(format!(
                "user for tenant {} inserted under {}",
                user.tenant_id,
                ctx.tenant_id()
            )));
        }

        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(user.id.as_uuid())
            .bind(ctx.tenant_id().as_uuid())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(&user.phone)
            .bind(user.active)
            .bind(user.last_login_at)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_user", e))?;

        decode("insert_user", user_from_row(&row))
    }

    async fn active_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND active");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("active_user", e))?;

        row.map(|r| decode("active_user", user_from_row(&r))).transpose()
    }

    async fn active_users_by_email(&self, email: &str) -> Result<Vec<User>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND active ORDER BY created_at ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(email)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("active_users_by_email", e))?;

        rows.iter()
            .map(|r| decode("active_users_by_email", user_from_row(r)))
            .collect()
    }

    async fn email_registered(&self, email: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("email_registered", e))
    }

    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id()), err)]
    async fn list_users(&self, ctx: &TenantContext, page: Pagination) -> Result<Page<User>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE tenant_id = $1 AND active \
             ORDER BY name ASC, id ASC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&sql)
            .bind(ctx.tenant_id().as_uuid())
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE tenant_id = $1 AND active")
            .bind(ctx.tenant_id().as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;

        Ok(Page {
            data: rows
                .iter()
                .map(|r| decode("list_users", user_from_row(r)))
                .collect::<Result<_, _>>()?,
            total: total.max(0) as u64,
            limit: page.limit,
            offset: page.offset,
        })
    }

    #[instrument(skip(self, ctx, change), fields(tenant_id = %ctx.tenant_id(), user_id = %id), err)]
    async fn update_user(&self, ctx: &TenantContext, id: UserId, change: UserChange) -> Result<Option<User>, StoreError> {
        let now = Utc::now();
        let base = match &change {
            UserChange::Role(_) => "UPDATE users SET role = $4, updated_at = $3",
            UserChange::Deactivate => "UPDATE users SET active = FALSE, updated_at = $3",
            UserChange::LoggedIn(_) => "UPDATE users SET last_login_at = $4, updated_at = $3",
        };
        let sql = format!("{base} WHERE tenant_id = $1 AND id = $2 AND active RETURNING {USER_COLUMNS}");

        let query = sqlx::query(&sql)
            .bind(*ctx.tenant_id().as_uuid())
            .bind(id.as_uuid())
            .bind(now);
        let query = match change {
            UserChange::Role(role) => query.bind(role.as_str().to_string()),
            UserChange::Deactivate => query,
            UserChange::LoggedIn(at) => query.bind(at),
        };

        let row = query
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_user", e))?;

        row.map(|r| decode("update_user", user_from_row(&r))).transpose()
    }
}
