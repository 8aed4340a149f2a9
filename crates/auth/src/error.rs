//! Authentication error types.

use thiserror::Error;

/// Failure while establishing an identity.
///
/// `Unauthenticated` is deliberately opaque: a missing header, a bad
/// signature, an expired token and a deactivated account all collapse into
/// it so callers cannot tell which check failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("unauthenticated")]
    Unauthenticated,

    /// The tenant behind a valid credential is suspended.
    #[error("account inactive or suspended")]
    TenantInactive,

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The identity directory could not be queried (storage outage).
    #[error("identity directory unavailable: {0}")]
    Directory(String),
}
