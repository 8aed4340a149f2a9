//! In-memory account store for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use jarvis_core::{TenantContext, TenantId, UserId};
use jarvis_query::{Page, Pagination};

use super::{AccountStore, Tenant, User, UserChange};
use crate::StoreError;
use crate::error::poisoned;

#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    tenants: RwLock<HashMap<TenantId, Tenant>>,
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, StoreError> {
        let mut tenants = self.tenants.write().map_err(|_| poisoned())?;
        if tenants.values().any(|t| t.subdomain == tenant.subdomain) {
            return Err(StoreError::Conflict("subdomain already taken".to_string()));
        }
        tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn tenant(&self, id: TenantId) -> Result<Option<Tenant>, StoreError> {
        let tenants = self.tenants.read().map_err(|_| poisoned())?;
        Ok(tenants.get(&id).cloned())
    }

    async fn tenant_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, StoreError> {
        let tenants = self.tenants.read().map_err(|_| poisoned())?;
        Ok(tenants.values().find(|t| t.subdomain == subdomain).cloned())
    }

    async fn insert_user(&self, ctx: &TenantContext, user: User) -> Result<User, StoreError> {
        if !ctx.admits(user.tenant_id) {
            return Err(StoreError::TenantIsolation(format!(
                "user for tenant {} inserted under {}",
                user.tenant_id,
                ctx.tenant_id()
            )));
        }
        let tenant_known = self.tenants.read().map_err(|_| poisoned())?.contains_key(&user.tenant_id);
        if !tenant_known {
            return Err(StoreError::InvalidReference("tenant does not exist".to_string()));
        }

        let mut users = self.users.write().map_err(|_| poisoned())?;
        if users
            .values()
            .any(|u| u.tenant_id == user.tenant_id && u.email == user.email)
        {
            return Err(StoreError::Conflict("user with this email already exists".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn active_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.get(&id).filter(|u| u.active).cloned())
    }

    async fn active_users_by_email(&self, email: &str) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        let mut found: Vec<User> = users
            .values()
            .filter(|u| u.active && u.email == email)
            .cloned()
            .collect();
        found.sort_by_key(|u| u.created_at);
        Ok(found)
    }

    async fn email_registered(&self, email: &str) -> Result<bool, StoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.values().any(|u| u.email == email))
    }

    async fn list_users(&self, ctx: &TenantContext, page: Pagination) -> Result<Page<User>, StoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        let mut visible: Vec<&User> = users
            .values()
            .filter(|u| ctx.admits(u.tenant_id) && u.active)
            .collect();
        visible.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(Page {
            total: visible.len() as u64,
            data: visible
                .into_iter()
                .skip(page.offset as usize)
                .take(page.limit as usize)
                .cloned()
                .collect(),
            limit: page.limit,
            offset: page.offset,
        })
    }

    async fn update_user(&self, ctx: &TenantContext, id: UserId, change: UserChange) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        let Some(user) = users
            .get_mut(&id)
            .filter(|u| ctx.admits(u.tenant_id) && u.active)
        else {
            return Ok(None);
        };

        let now = Utc::now();
        match change {
            UserChange::Role(role) => user.role = role,
            UserChange::Deactivate => user.active = false,
            UserChange::LoggedIn(at) => user.last_login_at = Some(at),
        }
        user.updated_at = now;
        Ok(Some(user.clone()))
    }
}
