use std::net::SocketAddr;

use anyhow::Context;

use jarvis_api::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    jarvis_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let app = jarvis_api::app::build_app(&config)
        .await
        .context("failed to wire services")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
