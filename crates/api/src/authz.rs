//! Role gates for the HTTP surface.
//!
//! The gates are extractors reading only request parts, so they run before
//! any body is parsed: a caller without the role gets 403 whatever it sent.

use std::marker::PhantomData;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use jarvis_auth::{Identity, Role, require_role};
use jarvis_infra::ServiceError;

use crate::app::errors::ApiError;
use crate::app::routes::resources::Routed;

/// Admits `admin` only.
pub fn require_admin(identity: &Identity) -> Result<(), ApiError> {
    require_role(identity, &[Role::ADMIN])?;
    Ok(())
}

fn identity(parts: &Parts) -> Result<Identity, ApiError> {
    parts
        .extensions
        .get::<Identity>()
        .cloned()
        .ok_or(ApiError::Service(ServiceError::Unauthenticated))
}

/// The caller, already checked to be an admin.
#[derive(Debug, Clone)]
pub struct Admin(pub Identity);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = identity(parts)?;
        require_admin(&identity)?;
        Ok(Admin(identity))
    }
}

/// The caller, checked against the write policy of resource `R`.
#[derive(Debug, Clone)]
pub struct WriteAccess<R> {
    pub identity: Identity,
    _resource: PhantomData<fn() -> R>,
}

#[async_trait]
impl<S, R> FromRequestParts<S> for WriteAccess<R>
where
    S: Send + Sync,
    R: Routed,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = identity(parts)?;
        if R::ADMIN_WRITES {
            require_admin(&identity)?;
        }
        Ok(WriteAccess {
            identity,
            _resource: PhantomData,
        })
    }
}
