use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use jarvis_activity::{AuditError, RECENT_DEFAULT_LIMIT};
use jarvis_core::TenantContext;
use jarvis_infra::{Crm, ServiceError};
use jarvis_query::Pagination;

use crate::app::dto::{PageQuery, Params, RecentQuery, parse_entity_id, parse_entity_type};
use crate::app::errors::ApiError;

pub fn router() -> Router {
    Router::new()
        .route("/", get(recent))
        .route("/:entity_type/:entity_id", get(by_entity))
}

fn audit_error(err: AuditError) -> ApiError {
    ServiceError::Internal(err.to_string()).into()
}

/// Newest first, optionally narrowed to one actor.
pub async fn recent(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    Params(query): Params<RecentQuery>,
) -> Result<Response, ApiError> {
    let page = Pagination::with_default(query.limit, None, RECENT_DEFAULT_LIMIT);
    let records = crm
        .activities
        .recent(&ctx, page, query.user_id)
        .await
        .map_err(audit_error)?;
    Ok(Json(records).into_response())
}

/// Full history of one row, including after it was deleted.
pub async fn by_entity(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    Path((entity_type, entity_id)): Path<(String, String)>,
    Params(query): Params<PageQuery>,
) -> Result<Response, ApiError> {
    let entity_type = parse_entity_type(&entity_type)?;
    let entity_id = parse_entity_id(&entity_id)?;
    let records = crm
        .activities
        .by_entity(&ctx, entity_type, entity_id, query.pagination())
        .await
        .map_err(audit_error)?;
    Ok(Json(records).into_response())
}
