use std::sync::Arc;

use dotenv::dotenv;
use review_narrator::{api, AnalyzerConfig, ReviewAnalyzer};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AnalyzerConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    info!("⚙️ Loaded config: {:?}", config);

    let shutdown = CancellationToken::new();
    let state = Arc::new(api::AppState {
        analyzer: Arc::new(ReviewAnalyzer::from_config(config)),
        shutdown: shutdown.clone(),
    });
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("🛑 Shutting down; cancelling in-flight analyses");
    shutdown.cancel();
}
