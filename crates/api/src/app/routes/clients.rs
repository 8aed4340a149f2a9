use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::post,
    Router,
};

use jarvis_auth::Identity;
use jarvis_clients::Client;
use jarvis_core::TenantContext;
use jarvis_infra::Crm;

use super::resources::crud_router;
use crate::app::dto::{Body, BulkClientsRequest};
use crate::app::errors::{ApiError, audited};
use crate::context::ClientMeta;

pub fn router() -> Router {
    crud_router::<Client>().route("/import/bulk", post(bulk_import))
}

/// Each record is created on its own; the response reports both sides.
pub async fn bulk_import(
    Extension(crm): Extension<Arc<Crm>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(identity): Extension<Identity>,
    ClientMeta(meta): ClientMeta,
    Body(body): Body<BulkClientsRequest>,
) -> Result<Response, ApiError> {
    if body.clients.is_empty() {
        return Err(ApiError::bad_request("clients array is required"));
    }
    let report = crm
        .clients
        .bulk_import(&ctx, identity.user_id, meta, body.clients)
        .await;
    Ok(audited(StatusCode::OK, report))
}
