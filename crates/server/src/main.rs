//! RecFlow server entry point.

use std::net::SocketAddr;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::Settings;
use server::http::create_router;
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env()?;

    // Structured JSON logs; RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    info!("RecFlow engine starting up");

    let port = settings.port;
    let state = AppState::new(settings).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {addr}");
    axum::serve(listener, create_router(state)).await?;

    info!("RecFlow engine shutting down");
    Ok(())
}
