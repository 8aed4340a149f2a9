//! Existence checks for the rows a write points at.

use std::sync::Arc;

use jarvis_clients::Client;
use jarvis_core::{DomainError, EntityType, TenantContext, UserId};
use jarvis_followups::Followup;
use jarvis_products::Product;
use jarvis_proposals::Proposal;
use jarvis_query::Reference;

use super::ServiceError;
use crate::{AccountStore, ResourceStore};

/// Resolves [`Reference`]s inside the caller's tenant.
///
/// A row that exists in another tenant is reported exactly like a missing
/// one.
#[derive(Clone)]
pub struct References {
    pub(crate) clients: Arc<dyn ResourceStore<Client>>,
    pub(crate) products: Arc<dyn ResourceStore<Product>>,
    pub(crate) proposals: Arc<dyn ResourceStore<Proposal>>,
    pub(crate) followups: Arc<dyn ResourceStore<Followup>>,
    pub(crate) accounts: Arc<dyn AccountStore>,
}

impl References {
    async fn exists(&self, ctx: &TenantContext, reference: &Reference) -> Result<bool, ServiceError> {
        let id = reference.id;
        let found = match reference.entity {
            EntityType::Client => self.clients.exists(ctx, id).await?,
            EntityType::Product => self.products.exists(ctx, id).await?,
            EntityType::Proposal => self.proposals.exists(ctx, id).await?,
            EntityType::Followup => self.followups.exists(ctx, id).await?,
            EntityType::User => self
                .accounts
                .active_user(UserId::from_uuid(*id.as_uuid()))
                .await?
                .is_some_and(|u| ctx.admits(u.tenant_id)),
            EntityType::Tenant => ctx.tenant_id().as_uuid() == id.as_uuid(),
        };
        Ok(found)
    }

    pub async fn check(&self, ctx: &TenantContext, references: &[Reference]) -> Result<(), ServiceError> {
        for reference in references {
            if !self.exists(ctx, reference).await? {
                tracing::debug!(
                    tenant_id = %ctx.tenant_id(),
                    entity_type = %reference.entity,
                    "dangling reference"
                );
                return Err(DomainError::validation(format!("invalid reference: {}", reference.entity)).into());
            }
        }
        Ok(())
    }
}
