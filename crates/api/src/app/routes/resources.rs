//! Handlers shared by every tenant-scoped resource.
//!
//! Each resource picks its service out of the [`Crm`] through [`Routed`]; the
//! handlers themselves are written once.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};

use jarvis_clients::Client;
use jarvis_core::TenantContext;
use jarvis_followups::Followup;
use jarvis_infra::{Crm, ResourceService, ServiceError};
use jarvis_products::Product;
use jarvis_proposals::Proposal;
use jarvis_query::Resource;

use crate::app::dto::{Body, Params, parse_entity_id};
use crate::app::errors::{ApiError, audited};
use crate::authz::WriteAccess;
use crate::context::ClientMeta;

pub trait Routed: Resource {
    /// Whether create/update/delete are restricted to admins.
    const ADMIN_WRITES: bool = false;

    fn service(crm: &Crm) -> &ResourceService<Self>;
}

impl Routed for Client {
    fn service(crm: &Crm) -> &ResourceService<Self> {
        &crm.clients
    }
}

impl Routed for Product {
    const ADMIN_WRITES: bool = true;

    fn service(crm: &Crm) -> &ResourceService<Self> {
        &crm.products
    }
}

impl Routed for Proposal {
    fn service(crm: &Crm) -> &ResourceService<Self> {
        &crm.proposals
    }
}

impl Routed for Followup {
    fn service(crm: &Crm) -> &ResourceService<Self> {
        &crm.followups
    }
}

/// `GET /` + `POST /`, `GET|PUT|DELETE /:id`.
pub fn crud_router<R: Routed>() -> Router {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route("/:id", get(find::<R>).put(update::<R>).delete(delete::<R>))
}

pub async fn list<R: Routed>(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    Params(filter): Params<R::Filter>,
) -> Result<Response, ApiError> {
    let page = R::service(&crm).list(&ctx, &filter).await?;
    Ok(Json(page).into_response())
}

pub async fn find<R: Routed>(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let row = R::service(&crm).find(&ctx, parse_entity_id(&id)?).await?;
    Ok(Json(row).into_response())
}

pub async fn create<R: Routed>(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    access: WriteAccess<R>,
    ClientMeta(meta): ClientMeta,
    Body(new): Body<R::New>,
) -> Result<Response, ApiError> {
    let created = R::service(&crm).create(&ctx, access.identity.user_id, meta, new).await?;
    Ok(audited(StatusCode::CREATED, created))
}

pub async fn update<R: Routed>(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    access: WriteAccess<R>,
    ClientMeta(meta): ClientMeta,
    Path(id): Path<String>,
    Body(patch): Body<R::Patch>,
) -> Result<Response, ApiError> {
    let id = parse_entity_id(&id)?;
    let updated = R::service(&crm)
        .update(&ctx, access.identity.user_id, meta, id, patch)
        .await?;
    Ok(audited(StatusCode::OK, updated))
}

/// Responds `{"message": "...", "<entity>": <summary>}`.
pub async fn delete<R: Routed>(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    access: WriteAccess<R>,
    ClientMeta(meta): ClientMeta,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_entity_id(&id)?;
    let deleted = R::service(&crm).delete(&ctx, access.identity.user_id, meta, id).await?;

    let entity = R::ENTITY.as_str();
    let summary = serde_json::to_value(&deleted.value).map_err(|e| ServiceError::Internal(e.to_string()))?;
    let mut body = Map::new();
    body.insert("message".to_string(), Value::String(format!("{entity} deleted")));
    body.insert(entity.to_string(), summary);

    Ok(audited(StatusCode::OK, deleted.map(|_| Value::Object(body))))
}
