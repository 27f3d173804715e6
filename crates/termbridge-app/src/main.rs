//! termbridge: serves a local shell to browser terminals over WebSocket.
//!
//! Each WebSocket client is the render surface of one session. The session's
//! transport is a PTY running the configured shell; when the shell exits the
//! client may ask for a fresh one.

mod cli;
mod logging;
mod pty;
mod server;
mod ws;

use std::path::Path;
use std::sync::Arc;

use termbridge_config::BridgeConfig;
use tokio::net::TcpListener;

use crate::pty::ShellLaunch;

#[tokio::main]
async fn main() -> termbridge_common::Result<()> {
    let args = cli::parse();

    // Config comes first: its log level is one of the filter sources.
    let loaded = termbridge_config::load_config(args.config.as_deref().map(Path::new));
    let level = loaded
        .as_ref()
        .map(|config| config.logging.level)
        .unwrap_or_default();
    logging::init(args.log_level.as_deref(), level);

    tracing::info!("termbridge v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {path}");
    }
    let mut config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        BridgeConfig::default()
    });
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    tracing::debug!("Effective config:\n{}", termbridge_config::config_to_json(&config));

    let launch = Arc::new(ShellLaunch::new(config.shell.clone(), args.execute));
    let addr = config.server.address();
    let config = Arc::new(config);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(shell = %launch.label(), "termbridge listening on ws://{addr}");

    tokio::select! {
        _ = server::serve(listener, config, launch) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
        }
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
