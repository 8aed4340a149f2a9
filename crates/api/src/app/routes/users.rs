//! Tenant user administration. Every route here is admin-only.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};

use jarvis_core::TenantContext;
use jarvis_infra::{Crm, NewUser};

use crate::app::dto::{Body, PageQuery, Params, RoleRequest, parse_user_id};
use crate::app::errors::{ApiError, audited};
use crate::authz::Admin;
use crate::context::ClientMeta;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id/role", put(change_role))
        .route("/:id/deactivate", post(deactivate))
}

pub async fn list_users(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    _admin: Admin,
    Params(query): Params<PageQuery>,
) -> Result<Response, ApiError> {
    let page = crm.accounts.list_users(&ctx, query.pagination()).await?;
    Ok(Json(page).into_response())
}

pub async fn create_user(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    Admin(identity): Admin,
    ClientMeta(meta): ClientMeta,
    Body(new): Body<NewUser>,
) -> Result<Response, ApiError> {
    let created = crm.accounts.create_user(&ctx, identity.user_id, meta, new).await?;
    Ok(audited(StatusCode::CREATED, created))
}

pub async fn change_role(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    Admin(identity): Admin,
    ClientMeta(meta): ClientMeta,
    Path(id): Path<String>,
    Body(body): Body<RoleRequest>,
) -> Result<Response, ApiError> {
    let id = parse_user_id(&id)?;
    let updated = crm
        .accounts
        .change_role(&ctx, identity.user_id, meta, id, body.role)
        .await?;
    Ok(audited(StatusCode::OK, updated))
}

pub async fn deactivate(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    Admin(identity): Admin,
    ClientMeta(meta): ClientMeta,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_user_id(&id)?;
    let user = crm.accounts.deactivate(&ctx, identity.user_id, meta, id).await?;
    Ok(audited(StatusCode::OK, user))
}
