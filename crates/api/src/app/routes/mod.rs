use axum::{routing::get, Router};

pub mod activities;
pub mod auth;
pub mod clients;
pub mod followups;
pub mod products;
pub mod proposals;
pub mod resources;
pub mod system;
pub mod users;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .nest("/clients", clients::router())
        .nest("/products", products::router())
        .nest("/proposals", proposals::router())
        .nest("/followups", followups::router())
        .nest("/activities", activities::router())
        .nest("/users", users::router())
}
