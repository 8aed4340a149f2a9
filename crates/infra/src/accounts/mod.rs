//! Tenants and users: the identity directory behind authentication.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use jarvis_auth::{AuthError, Identity, IdentityDirectory, Role};
use jarvis_core::{TenantContext, TenantId, UserId};
use jarvis_query::{Page, Pagination};

use crate::StoreError;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryAccountStore;
pub use postgres::PgAccountStore;

/// An organisation account; the unit of data partitioning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// Globally unique.
    pub subdomain: String,
    /// Company registration number, when supplied.
    pub document: Option<String>,
    pub plan: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub name: String,
    /// Lower-cased; unique within the tenant.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            tenant_id: self.tenant_id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role.clone(),
        }
    }
}

/// The mutations a user row supports. Users are never removed.
#[derive(Debug, Clone, PartialEq)]
pub enum UserChange {
    Role(Role),
    Deactivate,
    LoggedIn(DateTime<Utc>),
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// `Conflict` when the subdomain is taken.
    async fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, StoreError>;

    async fn tenant(&self, id: TenantId) -> Result<Option<Tenant>, StoreError>;

    async fn tenant_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, StoreError>;

    /// `Conflict` when the email is taken within the tenant.
    async fn insert_user(&self, ctx: &TenantContext, user: User) -> Result<User, StoreError>;

    /// Identity lookup by subject id. Only active users are returned.
    async fn active_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Active users with this (lower-cased) email, across tenants.
    async fn active_users_by_email(&self, email: &str) -> Result<Vec<User>, StoreError>;

    async fn email_registered(&self, email: &str) -> Result<bool, StoreError>;

    async fn list_users(&self, ctx: &TenantContext, page: Pagination) -> Result<Page<User>, StoreError>;

    /// `None` when the user is absent from the tenant or inactive.
    async fn update_user(&self, ctx: &TenantContext, id: UserId, change: UserChange) -> Result<Option<User>, StoreError>;
}

/// [`IdentityDirectory`] over an [`AccountStore`].
///
/// Re-reads the user on every call, so deactivating a user or suspending its
/// tenant takes effect on the next request even though tokens are stateless.
#[derive(Clone)]
pub struct AccountDirectory {
    store: Arc<dyn AccountStore>,
}

impl AccountDirectory {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentityDirectory for AccountDirectory {
    async fn find_active(&self, user_id: UserId) -> Result<Option<Identity>, AuthError> {
        let directory = |e: StoreError| AuthError::Directory(e.to_string());

        let Some(user) = self.store.active_user(user_id).await.map_err(directory)? else {
            return Ok(None);
        };
        let tenant_active = self
            .store
            .tenant(user.tenant_id)
            .await
            .map_err(directory)?
            .is_some_and(|t| t.active);

        Ok(tenant_active.then(|| user.identity()))
    }
}
