use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use jarvis_auth::Identity;
use jarvis_core::TenantContext;
use jarvis_followups::Followup;
use jarvis_infra::Crm;

use super::resources::crud_router;
use crate::app::dto::{AgendaQuery, Body, CompleteRequest, Params, parse_entity_id};
use crate::app::errors::{ApiError, audited};
use crate::context::ClientMeta;

pub fn router() -> Router {
    // static segments win over `/:id`
    crud_router::<Followup>()
        .route("/today", get(today))
        .route("/overdue", get(overdue))
        .route("/:id/complete", post(complete))
}

pub async fn today(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    Params(query): Params<AgendaQuery>,
) -> Result<Response, ApiError> {
    let page = crm.followups.today(&ctx, query.assigned_to, query.pagination()).await?;
    Ok(Json(page).into_response())
}

pub async fn overdue(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    Params(query): Params<AgendaQuery>,
) -> Result<Response, ApiError> {
    let page = crm.followups.overdue(&ctx, query.assigned_to, query.pagination()).await?;
    Ok(Json(page).into_response())
}

pub async fn complete(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(identity): Extension<Identity>,
    ClientMeta(meta): ClientMeta,
    Path(id): Path<String>,
    body: Option<Body<CompleteRequest>>,
) -> Result<Response, ApiError> {
    let id = parse_entity_id(&id)?;
    let result = body
        .and_then(|Body(req)| req.result)
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    let done = crm
        .followups
        .complete(&ctx, identity.user_id, meta, id, result)
        .await?;
    Ok(audited(StatusCode::OK, done))
}
