//! OrderDesk Server Binary
//!
//! Serves the orders and users API.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orderdesk_fx::ExchangeRateApiClient;
use orderdesk_server::{
    build_cache, build_repositories, build_state, router, LogFormat, ServerConfig,
};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env().map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    init_tracing(config.log_format);

    info!("Starting OrderDesk server");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    if config.exchange_rate.api_key.is_none() {
        info!("EXCHANGE_RATE_KEY not set, conversions will use rate 1");
    }

    let repos = build_repositories(&config).await?;
    let cache = build_cache(&config.cache).await?;
    let rate_client = Arc::new(ExchangeRateApiClient::new(config.exchange_rate.clone())?);

    let state = build_state(&config, repos, cache, rate_client);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(
        listen_addr = %config.listen_addr,
        listen_port = %config.listen_port,
        cache = ?config.cache.driver,
        persistent = config.database_url.is_some(),
        "Server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
