use plate_tracker::{router, AppState, Config, GeminiClient, SheetClient};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if config.sheet_endpoint.is_none() {
        warn!("SHEET_ENDPOINT is not set; the dashboard will start empty and edits will fail");
    }
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; reports will show a fallback message");
    }

    let store = SheetClient::new(config.sheet_endpoint.clone(), config.http_timeout)?;
    let reporter = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
        config.http_timeout,
    )?;
    let state = AppState::new(Arc::new(store), Arc::new(reporter));

    let initial = state.clone();
    tokio::spawn(async move { initial.load().await });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
