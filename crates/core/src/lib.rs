//! `jarvis-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, the per-request tenant scope and the
//! soft-delete lifecycle shared by every tenant-scoped entity.

pub mod entity;
pub mod error;
pub mod id;
pub mod tenant;

pub use entity::{EntityType, Lifecycle};
pub use error::{DomainError, DomainResult};
pub use id::{ActivityId, EntityId, TenantId, UserId};
pub use tenant::{TenantContext, TenantScoped};
