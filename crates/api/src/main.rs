use std::sync::Arc;

use anyhow::Context;

use coins_api::app::{build_app, services};
use coins_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    coins_observability::init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    let services = services::build_services(&config.storage)
        .await
        .context("failed to initialize storage")?;

    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        return;
    }
    tracing::info!("shutdown signal received");
}
