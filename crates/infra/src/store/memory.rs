//! In-memory resource store for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use jarvis_core::{EntityId, TenantContext};
use jarvis_query::{ListQuery, Page, Record, Resource};

use super::{ResourceStore, check_scope};
use crate::StoreError;
use crate::error::poisoned;

/// Rows keyed by id; soft-deleted rows are kept for history.
///
/// Enforces the per-tenant uniqueness listed in the resource's column set
/// among live rows, as the Postgres partial indexes do.
#[derive(Debug)]
pub struct MemoryStore<R> {
    rows: RwLock<HashMap<EntityId, R>>,
}

impl<R> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn visible<R: Record>(ctx: &TenantContext, row: &R) -> bool {
    ctx.admits(row.tenant_id()) && row.deleted_at().is_none()
}

fn check_unique<R: Resource>(rows: &HashMap<EntityId, R>, candidate: &R) -> Result<(), StoreError> {
    for column in R::COLUMNS.unique {
        let value = candidate.column(column);
        if value.is_null() {
            continue;
        }
        let clash = rows.values().any(|other| {
            other.id() != candidate.id()
                && other.tenant_id() == candidate.tenant_id()
                && other.deleted_at().is_none()
                && other.column(column) == value
        });
        if clash {
            return Err(StoreError::Conflict(format!(
                "{} with this {column} already exists",
                R::ENTITY
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for MemoryStore<R> {
    async fn insert(&self, ctx: &TenantContext, row: R) -> Result<R, StoreError> {
        if !ctx.admits(row.tenant_id()) {
            return Err(StoreError::TenantIsolation(format!(
                "{} row for tenant {} inserted under {}",
                R::ENTITY,
                row.tenant_id(),
                ctx.tenant_id()
            )));
        }
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        if rows.contains_key(&row.id()) {
            return Err(StoreError::Conflict(format!("{} id already exists", R::ENTITY)));
        }
        check_unique(&rows, &row)?;
        rows.insert(row.id(), row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, ctx: &TenantContext, id: EntityId) -> Result<Option<R>, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.get(&id).filter(|r| visible(ctx, *r)).cloned())
    }

    async fn exists(&self, ctx: &TenantContext, id: EntityId) -> Result<bool, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.get(&id).is_some_and(|r| visible(ctx, r)))
    }

    async fn list(&self, ctx: &TenantContext, query: &ListQuery) -> Result<Page<R>, StoreError> {
        check_scope(ctx, query)?;
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(query.run(rows.values()))
    }

    async fn update(
        &self,
        ctx: &TenantContext,
        id: EntityId,
        patch: &R::Patch,
        now: DateTime<Utc>,
    ) -> Result<Option<R>, StoreError> {
        if R::changes(patch, now).is_empty() {
            return Ok(None);
        }
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let Some(current) = rows.get(&id).filter(|r| visible(ctx, *r)) else {
            return Ok(None);
        };

        let mut next = current.clone();
        next.apply(patch, now);
        check_unique(&rows, &next)?;
        rows.insert(id, next.clone());
        Ok(Some(next))
    }

    async fn soft_delete(&self, ctx: &TenantContext, id: EntityId, at: DateTime<Utc>) -> Result<Option<R>, StoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        match rows.get_mut(&id) {
            Some(row) if visible(ctx, &*row) => {
                row.mark_deleted(at);
                Ok(Some(row.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use jarvis_clients::{Client, ClientFilter, ClientPatch, ClientType, NewClient};
    use jarvis_core::{TenantId, UserId};
    use jarvis_query::ListOptions;

    use super::*;

    fn new_client(name: &str, document: &str) -> NewClient {
        NewClient {
            kind: ClientType::Individual,
            name: name.to_string(),
            document: document.to_string(),
            email: None,
            phone: None,
            whatsapp: None,
            address: None,
            city: None,
            state: None,
            zipcode: None,
            company_name: None,
            occupation: None,
            status: None,
            source: None,
            tags: vec![],
            rating: None,
            notes: None,
        }
    }

    fn client(ctx: &TenantContext, name: &str, document: &str) -> Client {
        Client::create(EntityId::new(), ctx, UserId::new(), Utc::now(), new_client(name, document))
    }

    #[tokio::test]
    async fn rows_of_other_tenants_are_not_found() {
        let store = MemoryStore::<Client>::new();
        let a = TenantContext::new(TenantId::new());
        let b = TenantContext::new(TenantId::new());
        let row = store.insert(&a, client(&a, "Ana", "1")).await.unwrap();

        assert!(store.find_by_id(&a, row.id).await.unwrap().is_some());
        assert!(store.find_by_id(&b, row.id).await.unwrap().is_none());
        assert!(!store.exists(&b, row.id).await.unwrap());
        assert!(store.soft_delete(&b, row.id, Utc::now()).await.unwrap().is_none());
        let patch = ClientPatch {
            name: Some("stolen".into()),
            ..ClientPatch::default()
        };
        assert!(store.update(&b, row.id, &patch, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_refuses_rows_of_another_tenant() {
        let store = MemoryStore::<Client>::new();
        let a = TenantContext::new(TenantId::new());
        let b = TenantContext::new(TenantId::new());
        let err = store.insert(&b, client(&a, "Ana", "1")).await.unwrap_err();
        assert!(matches!(err, StoreError::TenantIsolation(_)));
    }

    #[tokio::test]
    async fn document_is_unique_per_tenant_among_live_rows() {
        let store = MemoryStore::<Client>::new();
        let a = TenantContext::new(TenantId::new());
        let b = TenantContext::new(TenantId::new());

        let first = store.insert(&a, client(&a, "Ana", "111")).await.unwrap();
        let dup = store.insert(&a, client(&a, "Bia", "111")).await.unwrap_err();
        assert!(matches!(dup, StoreError::Conflict(_)));

        store.insert(&b, client(&b, "Ana", "111")).await.unwrap();

        store.soft_delete(&a, first.id, Utc::now()).await.unwrap();
        store.insert(&a, client(&a, "Bia", "111")).await.unwrap();
    }

    #[tokio::test]
    async fn deleted_rows_leave_reads() {
        let store = MemoryStore::<Client>::new();
        let a = TenantContext::new(TenantId::new());
        let row = store.insert(&a, client(&a, "Ana", "1")).await.unwrap();
        store.insert(&a, client(&a, "Bia", "2")).await.unwrap();

        let deleted = store.soft_delete(&a, row.id, Utc::now()).await.unwrap().unwrap();
        assert!(deleted.deleted_at.is_some());
        assert!(store.soft_delete(&a, row.id, Utc::now()).await.unwrap().is_none());
        assert!(store.find_by_id(&a, row.id).await.unwrap().is_none());

        let page = store.list(&a, &ClientFilter::default().to_query(&a)).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].name, "Bia");
    }

    #[tokio::test]
    async fn query_built_for_another_tenant_is_refused() {
        let store = MemoryStore::<Client>::new();
        let a = TenantContext::new(TenantId::new());
        let b = TenantContext::new(TenantId::new());
        let err = store.list(&a, &ClientFilter::default().to_query(&b)).await.unwrap_err();
        assert!(matches!(err, StoreError::TenantIsolation(_)));
    }

    #[tokio::test]
    async fn empty_patch_updates_nothing() {
        let store = MemoryStore::<Client>::new();
        let a = TenantContext::new(TenantId::new());
        let row = store.insert(&a, client(&a, "Ana", "1")).await.unwrap();
        assert!(store.update(&a, row.id, &ClientPatch::default(), Utc::now()).await.unwrap().is_none());
    }
}
