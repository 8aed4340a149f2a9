//! Infrastructure layer: storage adapters and application services.
//!
//! Two interchangeable backends sit behind the same traits: in-memory (tests
//! and local dev) and Postgres via `sqlx`. Both take a
//! [`jarvis_core::TenantContext`] on every data access.

pub mod accounts;
pub mod activity;
pub mod error;
pub mod schema;
pub mod services;
pub mod store;

pub use accounts::{
    AccountDirectory, AccountStore, InMemoryAccountStore, PgAccountStore, Tenant, User, UserChange,
};
pub use activity::PgActivityLog;
pub use error::{StoreError, map_sqlx_error};
pub use services::{
    AccountService, Backend, BulkImportError, BulkImportReport, CONFLICT_MESSAGE, Crm, INTERNAL_MESSAGE,
    INVALID_REFERENCE_MESSAGE, LoginRequest, NewUser, Profile, References, RegisterRequest, ResourceService,
    ServiceError, Session,
};
pub use store::{MemoryStore, PgRecord, PgStore, ResourceStore};
