//! Storage error model.
//!
//! ## Error Mapping
//!
//! | SQLx error | SQLSTATE | `StoreError` |
//! |---|---|---|
//! | unique violation | `23505` | `Conflict` |
//! | foreign key violation | `23503` | `InvalidReference` |
//! | row decode / column type | n/a | `Decode` |
//! | anything else | any | `Backend` |

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness rule was violated.
    #[error("duplicate entry: {0}")]
    Conflict(String),

    /// A referenced row does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A write tried to cross the tenant boundary. Structurally unreachable.
    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("failed to decode row: {0}")]
    Decode(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("{operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::InvalidReference(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) | sqlx::Error::Decode(_) => {
            StoreError::Decode(format!("{operation}: {err}"))
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        _ => StoreError::Backend(format!("{operation}: {err}")),
    }
}

/// Error used by the in-memory adapters when a lock is poisoned.
pub(crate) fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}
