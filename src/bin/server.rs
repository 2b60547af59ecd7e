//! rahl HTTP server binary.
//!
//! Builds the capability registry from configuration and serves it over
//! HTTP until SIGINT/SIGTERM.
//!
//! # Environment Variables
//!
//! - `RAHL_CONFIG`: Path to a YAML config file (optional)
//! - `HOST`: Bind address (default: 0.0.0.0)
//! - `PORT`: HTTP port (default: 10000)
//! - `RUST_LOG`: Tracing filter (default: "info,rahl=debug")
//!
//! # Usage
//!
//! ```bash
//! RAHL_CONFIG=rahl.yaml cargo run --bin server
//! ```

use anyhow::Context;
use rahl::capabilities::loader::load_registry_with_report;
use rahl::server::{app_router, AppState};
use rahl::RahlConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rahl=debug".into()),
        )
        .init();

    let config = RahlConfig::load().context("failed to load configuration")?;
    let bind_addr = config.server.bind_addr();

    let (registry, report) = load_registry_with_report(&config);
    for (name, reason) in &report.skipped {
        tracing::warn!("Capability '{}' not loaded: {}", name, reason);
    }
    tracing::info!(
        "Registry ready: {} capabilities, {} detection rules",
        registry.len(),
        registry.rules().len()
    );

    let app = app_router(AppState::new(registry));

    tracing::info!("rahl server starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health       : liveness check");
    tracing::info!("  GET  /capabilities : capability listing");
    tracing::info!("  POST /detect       : keyword routing");
    tracing::info!("  POST /execute      : run a capability");
    tracing::info!("  POST /chat         : detect and run");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Ctrl-C received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
