use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use jarvis_auth::IdentityResolver;

use crate::app::errors::ApiError;

#[derive(Clone)]
pub struct AuthState {
    pub resolver: IdentityResolver,
}

/// Resolves the bearer token into an [`jarvis_auth::Identity`] and derives the
/// request's [`jarvis_core::TenantContext`] from it.
///
/// Both land in request extensions. Nothing in the request body or query can
/// influence the tenant.
pub async fn auth_middleware(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let identity = match state.resolver.resolve_header(header.as_deref()).await {
        Ok(identity) => identity,
        Err(err) => {
            tracing::debug!(error = %err, path = %req.uri().path(), "request not authenticated");
            return ApiError::from(err).into_response();
        }
    };

    req.extensions_mut().insert(identity.tenant_context());
    req.extensions_mut().insert(identity);

    next.run(req).await
}

/// Logs `method path status duration_ms` for every request.
pub async fn request_logger(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}
