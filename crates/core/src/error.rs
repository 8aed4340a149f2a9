//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// conflicts, visibility). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, dangling reference).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The entity is absent or not visible under the current tenant scope.
    ///
    /// Carries no detail: "exists in another tenant" must be indistinguishable
    /// from "does not exist".
    #[error("not found")]
    NotFound,

    /// A uniqueness rule was violated (duplicate document, email, subdomain).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A data path tried to cross the tenant boundary.
    ///
    /// Structurally unreachable; any occurrence is a defect.
    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn tenant_isolation(msg: impl Into<String>) -> Self {
        Self::TenantIsolation(msg.into())
    }
}
