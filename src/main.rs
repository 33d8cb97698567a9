use bsky_stream::app;
use bsky_stream::state::{AppConfig, AppState};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Log initialized");

    let config = AppConfig::from_env();
    tracing::info!(
        "Using AppView {} (page limit {}, upstream timeout {:?}, deadline {:?})",
        config.bsky_api_url,
        config.page_limit,
        config.upstream_timeout,
        config.request_deadline
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app_state = AppState::new(config)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Stream server listening on {}", addr);

    axum::serve(listener, app(app_state)).await?;

    Ok(())
}
