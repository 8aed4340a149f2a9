use thiserror::Error;

use jarvis_auth::{AuthError, AuthzError};
use jarvis_core::DomainError;

use crate::StoreError;

/// Failure of an application service call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("account inactive or suspended")]
    TenantInactive,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub const CONFLICT_MESSAGE: &str = "a record with this value already exists";
pub const INVALID_REFERENCE_MESSAGE: &str = "referenced record does not exist";
pub const INTERNAL_MESSAGE: &str = "internal error";

impl ServiceError {
    pub fn not_found() -> Self {
        Self::Domain(DomainError::NotFound)
    }

    /// Text safe to hand back to a caller. Storage details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Domain(DomainError::Validation(msg) | DomainError::InvalidId(msg) | DomainError::Conflict(msg)) => {
                msg.clone()
            }
            Self::Domain(DomainError::NotFound) => "not found".to_string(),
            Self::Store(StoreError::Conflict(_)) => CONFLICT_MESSAGE.to_string(),
            Self::Store(StoreError::InvalidReference(_)) => INVALID_REFERENCE_MESSAGE.to_string(),
            Self::Unauthenticated => "authentication required".to_string(),
            Self::Forbidden => "insufficient role".to_string(),
            Self::TenantInactive => "account inactive or suspended".to_string(),
            Self::Domain(DomainError::TenantIsolation(_)) | Self::Store(_) | Self::Internal(_) => {
                INTERNAL_MESSAGE.to_string()
            }
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated => Self::Unauthenticated,
            AuthError::TenantInactive => Self::TenantInactive,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(_: AuthzError) -> Self {
        Self::Forbidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_message_hides_storage_detail() {
        let dup = ServiceError::Store(StoreError::Conflict(
            "insert: duplicate key value violates unique constraint \"clients_document_live_idx\"".to_string(),
        ));
        assert_eq!(dup.public_message(), CONFLICT_MESSAGE);

        let backend = ServiceError::Store(StoreError::Backend("connection reset by peer".to_string()));
        assert_eq!(backend.public_message(), INTERNAL_MESSAGE);

        let fk = ServiceError::Store(StoreError::InvalidReference("insert: violates foreign key".to_string()));
        assert_eq!(fk.public_message(), INVALID_REFERENCE_MESSAGE);

        let invalid = ServiceError::Domain(DomainError::validation("invalid reference: client"));
        assert_eq!(invalid.public_message(), "invalid reference: client");
    }
}
