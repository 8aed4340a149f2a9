//! `jarvis-auth`: authentication/authorization boundary (zero-trust).
//!
//! Turns a network credential into a trusted, tenant-scoped [`Identity`]:
//! token issuance and verification, identity resolution against a live
//! directory, and role gating. Decoupled from HTTP and storage; storage plugs
//! in through [`IdentityDirectory`].

pub mod authorize;
pub mod claims;
pub mod error;
pub mod identity;
pub mod password;
pub mod resolver;
pub mod roles;
pub mod token;

pub use authorize::{AuthzError, require_role};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use error::AuthError;
pub use identity::Identity;
pub use password::{Argon2Passwords, PasswordHasher};
pub use resolver::{IdentityDirectory, IdentityResolver};
pub use roles::Role;
pub use token::{IssuedToken, TokenConfig, TokenRequest, TokenService, extract_bearer};
