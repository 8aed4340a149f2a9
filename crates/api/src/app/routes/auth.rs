use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use jarvis_auth::Identity;
use jarvis_infra::{Crm, LoginRequest, RegisterRequest};

use crate::app::dto::Body;
use crate::app::errors::{ApiError, audited};
use crate::context::ClientMeta;

/// Routes reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub async fn register(
    Extension(crm): Extension<Arc<Crm>>,
    ClientMeta(meta): ClientMeta,
    Body(request): Body<RegisterRequest>,
) -> Result<Response, ApiError> {
    let session = crm.accounts.register(request, meta).await?;
    Ok(audited(StatusCode::CREATED, session))
}

pub async fn login(
    Extension(crm): Extension<Arc<Crm>>,
    ClientMeta(meta): ClientMeta,
    Body(request): Body<LoginRequest>,
) -> Result<Response, ApiError> {
    let session = crm.accounts.login(request, meta).await?;
    Ok(audited(StatusCode::OK, session))
}

pub async fn me(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, ApiError> {
    let profile = crm.accounts.me(&identity).await?;
    Ok(Json(profile).into_response())
}
