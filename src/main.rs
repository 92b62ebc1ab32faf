//! snowfleet-relay server entry point.
//!
//! Starts the Axum HTTP server with WebSocket, long-polling and REST
//! endpoints.

use tracing_subscriber::EnvFilter;

use snowfleet_relay::api;
use snowfleet_relay::app_state::AppState;
use snowfleet_relay::config::RelayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = RelayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        addr = %config.listen_addr,
        dashboard_room = %config.dashboard_room,
        "starting snowfleet-relay"
    );

    // Build application state
    let listen_addr = config.listen_addr;
    let app_state = AppState::new(config);
    let sweeper = api::handlers::poll::spawn_sweeper(&app_state);

    // Build router
    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(addr = %listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
