//! printbay-server: HTTP API for The Printed Bay storefront

use printbay_server::{AppState, Config, build_app, logger};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env();
    logger::init(&config)?;

    tracing::info!(environment = %config.environment, "Starting printbay-server");

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let state = AppState::new(config).await?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("HTTP listening on {http_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
