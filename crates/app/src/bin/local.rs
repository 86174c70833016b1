// KB chat bridge - webhook server

use std::net::SocketAddr;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kbchat_common::config::Config;
use kbchat_telegram::TelegramConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loads .env before the filter is built so LOG_LEVEL and RUST_LOG from it apply
    let config = Config::from_env();

    let filter = config
        .as_ref()
        .ok()
        .and_then(|config| EnvFilter::try_new(config.log_filter()).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).pretty().init();

    let config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("################################################");
    info!("# Telegram bot name {}", config.telegram_bot_name);
    info!("################################################");

    let (app, services) = kbchat_app::create_app(&config).await.map_err(|e| {
        error!("Failed to create application: {:#}", e);
        e
    })?;

    if config.telegram_provider == "mock" {
        info!("Mock transport in use, skipping webhook registration");
    } else {
        let webhook_url = TelegramConfig::from_config(&config).webhook_url;
        services
            .transport
            .set_webhook(&webhook_url)
            .await
            .map_err(|e| {
                error!("Failed to register webhook: {}", e);
                anyhow::anyhow!("Webhook registration failed: {}", e)
            })?;
        info!("Webhook registered at {}", webhook_url);
    }

    let router = app.router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .into_inner(),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Health check available at http://{}/healthcheck", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, draining in-flight updates");
    app.worker.drain().await;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
