//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: backend selection and service graph
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON-reporting extractors
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use jarvis_infra::Crm;

use crate::{ApiConfig, middleware};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::StartupError;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> Result<Router, StartupError> {
    let crm = services::build_services(config).await?;
    Ok(router(crm))
}

/// Router over an already wired [`Crm`].
pub fn router(crm: Crm) -> Router {
    let auth_state = middleware::AuthState {
        resolver: crm.resolver.clone(),
    };
    let crm = Arc::new(crm);

    // Protected routes: require auth + tenant context. `route_layer` keeps the
    // public auth routes merged below outside the middleware.
    let api = routes::router()
        .route_layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ))
        .merge(routes::auth::public_router());

    Router::new()
        .route("/", get(routes::system::info))
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        .fallback(routes::system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_logger))
                .layer(Extension(crm)),
        )
}
