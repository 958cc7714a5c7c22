use allowance_backend::config::AppConfig;
use allowance_backend::{create_router, initialize_backend};
use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    let addr = config.socket_addr()?;

    let backend = initialize_backend(&config).await?;

    let scheduler_handle = if config.scheduler.enabled {
        Some(
            backend
                .payment_scheduler
                .clone()
                .spawn(config.scheduler.poll_interval()),
        )
    } else {
        info!("Payment scheduler disabled");
        None
    };

    let app = create_router(backend.app_state, config.cors_origin.as_deref())?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = scheduler_handle {
        handle.abort();
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
