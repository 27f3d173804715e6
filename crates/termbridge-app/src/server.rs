//! Accept loop: one task per browser connection.

use std::sync::Arc;

use termbridge_config::BridgeConfig;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

use crate::pty::ShellLaunch;
use crate::ws::handle_connection;

pub async fn serve(listener: TcpListener, config: Arc<BridgeConfig>, launch: Arc<ShellLaunch>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let config = Arc::clone(&config);
                let launch = Arc::clone(&launch);
                tokio::spawn(async move {
                    match accept_async(stream).await {
                        Ok(ws) => handle_connection(ws, addr, config, launch).await,
                        Err(e) => {
                            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}
