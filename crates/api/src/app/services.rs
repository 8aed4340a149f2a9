//! Infrastructure wiring: picks the backend and builds the service graph.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use jarvis_auth::{Argon2Passwords, TokenConfig, TokenService};
use jarvis_infra::schema::init_schema;
use jarvis_infra::{Backend, Crm, StoreError};

use crate::ApiConfig;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to connect to Postgres: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("failed to prepare the schema: {0}")]
    Schema(#[from] StoreError),
}

async fn build_backend(config: &ApiConfig) -> Result<Backend, StartupError> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; using the in-memory backend (data is lost on exit)");
        return Ok(Backend::in_memory());
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(url)
        .await?;
    init_schema(&pool).await?;
    tracing::info!(max_connections = config.database_max_connections, "connected to Postgres");

    Ok(Backend::postgres(Arc::new(pool)))
}

pub async fn build_services(config: &ApiConfig) -> Result<Crm, StartupError> {
    let backend = build_backend(config).await?;
    let tokens = TokenService::new(&TokenConfig::new(config.jwt_secret.clone()).with_ttl(config.token_ttl));
    Ok(Crm::new(backend, Arc::new(tokens), Arc::new(Argon2Passwords)))
}
