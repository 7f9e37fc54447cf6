use std::path::{Path, PathBuf};
use std::sync::Arc;

use frame_relay_api::{build_app, serve, AppState, AssetTable};
use frame_relay_common::config::Config;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    let server = config.server;
    let assets = match AssetTable::load(Path::new(&server.web_root)) {
        Ok(a) => a,
        Err(e) => {
            error!(error = %e, "failed to load static assets");
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(assets, server.max_frame_bytes));
    let app = build_app(state, server.max_request_bytes);

    let addr = server.listen_addr();
    info!(
        addr,
        web_root = server.web_root,
        max_frame_bytes = server.max_frame_bytes,
        "frame-relay server starting"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        eprintln!("Failed to bind to {addr}: {e}");
        std::process::exit(1);
    });

    if let Err(e) = serve(listener, app, shutdown_signal()).await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
    info!("server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
