//! Application services: the operations the HTTP surface calls.
//!
//! Services take an explicit [`jarvis_core::TenantContext`] and acting
//! [`jarvis_core::UserId`]; they never read ambient request state.

use std::sync::Arc;

use sqlx::PgPool;

use jarvis_activity::{ActivityLog, Auditor, InMemoryActivityLog};
use jarvis_auth::{IdentityResolver, PasswordHasher, TokenService};
use jarvis_clients::Client;
use jarvis_followups::Followup;
use jarvis_products::Product;
use jarvis_proposals::Proposal;

use crate::{
    AccountDirectory, AccountStore, InMemoryAccountStore, MemoryStore, PgAccountStore, PgActivityLog, PgStore,
    ResourceStore,
};

pub mod accounts;
pub mod error;
pub mod references;
pub mod resources;
pub mod slug;

pub use accounts::{AccountService, LoginRequest, NewUser, Profile, RegisterRequest, Session};
pub use error::{CONFLICT_MESSAGE, INTERNAL_MESSAGE, INVALID_REFERENCE_MESSAGE, ServiceError};
pub use references::References;
pub use resources::{BulkImportError, BulkImportReport, ResourceService};

/// The storage adapters one process runs against.
#[derive(Clone)]
pub struct Backend {
    pub clients: Arc<dyn ResourceStore<Client>>,
    pub products: Arc<dyn ResourceStore<Product>>,
    pub proposals: Arc<dyn ResourceStore<Proposal>>,
    pub followups: Arc<dyn ResourceStore<Followup>>,
    pub accounts: Arc<dyn AccountStore>,
    pub activities: Arc<dyn ActivityLog>,
}

impl Backend {
    pub fn in_memory() -> Self {
        Self {
            clients: Arc::new(MemoryStore::<Client>::new()),
            products: Arc::new(MemoryStore::<Product>::new()),
            proposals: Arc::new(MemoryStore::<Proposal>::new()),
            followups: Arc::new(MemoryStore::<Followup>::new()),
            accounts: Arc::new(InMemoryAccountStore::new()),
            activities: Arc::new(InMemoryActivityLog::new()),
        }
    }

    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self {
            clients: Arc::new(PgStore::<Client>::new(pool.clone())),
            products: Arc::new(PgStore::<Product>::new(pool.clone())),
            proposals: Arc::new(PgStore::<Proposal>::new(pool.clone())),
            followups: Arc::new(PgStore::<Followup>::new(pool.clone())),
            accounts: Arc::new(PgAccountStore::new(pool.clone())),
            activities: Arc::new(PgActivityLog::new(pool)),
        }
    }
}

/// Every service of the CRM, wired over one [`Backend`].
#[derive(Clone)]
pub struct Crm {
    pub clients: ResourceService<Client>,
    pub products: ResourceService<Product>,
    pub proposals: ResourceService<Proposal>,
    pub followups: ResourceService<Followup>,
    pub accounts: AccountService,
    pub activities: Arc<dyn ActivityLog>,
    pub resolver: IdentityResolver,
}

impl Crm {
    pub fn new(backend: Backend, tokens: Arc<TokenService>, passwords: Arc<dyn PasswordHasher>) -> Self {
        let auditor = Auditor::new(backend.activities.clone());
        let references = References {
            clients: backend.clients.clone(),
            products: backend.products.clone(),
            proposals: backend.proposals.clone(),
            followups: backend.followups.clone(),
            accounts: backend.accounts.clone(),
        };
        let directory = AccountDirectory::new(backend.accounts.clone());

        Self {
            clients: ResourceService::new(backend.clients, auditor.clone(), references.clone()),
            products: ResourceService::new(backend.products.clone(), auditor.clone(), references.clone()),
            proposals: ResourceService::new(backend.proposals, auditor.clone(), references.clone()),
            followups: ResourceService::new(backend.followups, auditor.clone(), references),
            accounts: AccountService::new(
                backend.accounts,
                backend.products,
                auditor,
                tokens.clone(),
                passwords,
            ),
            activities: backend.activities,
            resolver: IdentityResolver::new(tokens, Arc::new(directory)),
        }
    }
}
