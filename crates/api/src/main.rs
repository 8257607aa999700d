use anyhow::Context;

use trafo_infra::config::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    trafo_observability::init();

    let config = ServiceConfig::from_env().context("invalid configuration")?;
    tracing::info!(config = ?config, "starting trafo-api");

    let app = trafo_api::app::build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
