//! Per-connection handler: one browser socket, one session, one shell at a
//! time.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use termbridge_config::BridgeConfig;
use termbridge_session::{InputEvent, SessionBridge, SessionEvent, SessionState};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use super::protocol::{ClientMessage, ServerMessage};
use super::surface::WsSurface;
use crate::pty::{PtyChannel, ShellLaunch};

/// Frames queued for the socket writer task.
const OUTBOUND_QUEUE: usize = 64;

/// Input events queued for the session.
const INPUT_QUEUE: usize = 256;

struct Connection {
    peer: SocketAddr,
    bridge: SessionBridge,
    launch: Arc<ShellLaunch>,
    outbound: mpsc::Sender<Message>,
    input: mpsc::Sender<InputEvent>,
}

/// Serve one WebSocket client until it goes away.
pub async fn handle_connection<S>(
    ws: WebSocketStream<S>,
    peer: SocketAddr,
    config: Arc<BridgeConfig>,
    launch: Arc<ShellLaunch>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sink, mut stream) = ws.split();

    // 1. Socket writer task. Output frames and control messages share it.
    let (outbound, mut outbound_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
    tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if sink.send(frame).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // 2. Session with this socket as its render surface and sole input source.
    let surface = Arc::new(WsSurface::new(outbound.clone()));
    let bridge = SessionBridge::new(config, surface);
    let mut events = bridge.handle().subscribe();
    let (input, input_rx) = mpsc::channel(INPUT_QUEUE);
    if let Err(e) = bridge.attach_input(input_rx) {
        tracing::warn!(peer = %peer, error = %e, "Could not attach input");
        return;
    }

    let conn = Connection {
        peer,
        bridge,
        launch,
        outbound,
        input,
    };
    tracing::info!(peer = %peer, session = %conn.bridge.id().short(), "Client connected");

    conn.send(ServerMessage::SessionReady {
        session_id: conn.bridge.id().to_string(),
    })
    .await;
    conn.start_shell().await;

    // 3. Forwarding loop.
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => conn.on_event(event).await,
                Err(RecvError::Lagged(missed)) => {
                    tracing::debug!(peer = %peer, missed, "Session events lagged");
                    conn.send_state(conn.bridge.state()).await;
                }
                Err(RecvError::Closed) => break,
            },

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if !conn.on_text(text.as_str()).await {
                        break;
                    }
                }
                Some(Ok(Message::Binary(data))) => {
                    if !conn.forward(InputEvent::keystroke(data.to_vec())).await {
                        break;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = conn.outbound.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!(peer = %peer, error = %e, "WS error");
                    break;
                }
                _ => {}
            }
        }
    }

    // 4. Cleanup.
    tracing::info!(peer = %peer, session = %conn.bridge.id().short(), "Client disconnected");
    if let Err(e) = conn.bridge.disconnect().await {
        tracing::warn!(peer = %peer, error = %e, "Session close failed");
    }
}

impl Connection {
    async fn send(&self, message: ServerMessage) {
        if let Some(frame) = message.to_frame() {
            let _ = self.outbound.send(frame).await;
        }
    }

    async fn send_state(&self, state: SessionState) {
        let title = self.bridge.session().await.title();
        self.send(ServerMessage::State { state, title }).await;
    }

    /// Bind a fresh shell: the first one, or a replacement after the last
    /// one ended.
    async fn start_shell(&self) {
        let channel = PtyChannel::new(Arc::clone(&self.launch));
        let result = if self.bridge.state() == SessionState::Idle {
            let size = self.bridge.size();
            self.bridge.connect(channel, size.rows, size.cols).await
        } else {
            self.bridge.reconnect(channel).await
        };
        if let Err(e) = result {
            tracing::warn!(peer = %self.peer, error = %e, "Shell start failed");
            self.send(ServerMessage::Error {
                message: e.to_string(),
            })
            .await;
        }
    }

    async fn on_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::StateChanged { to, .. } => self.send_state(to).await,
            SessionEvent::Resized(_) => self.send_state(self.bridge.state()).await,
            SessionEvent::Disconnected { reason } => {
                self.send(ServerMessage::Disconnected {
                    reason: reason.to_string(),
                })
                .await;
            }
            SessionEvent::SurfaceWriteFailed { .. } => {}
        }
    }

    /// Returns `false` once the session stopped taking input.
    async fn on_text(&self, text: &str) -> bool {
        let message: ClientMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(peer = %self.peer, error = %e, "Ignoring malformed client message");
                return true;
            }
        };

        match message {
            ClientMessage::Reconnect => {
                self.start_shell().await;
                true
            }
            ClientMessage::Repaint => {
                if let Err(e) = self.bridge.repaint().await {
                    tracing::debug!(peer = %self.peer, error = %e, "Repaint failed");
                }
                true
            }
            other => match other.into_input() {
                Some(event) => self.forward(event).await,
                None => true,
            },
        }
    }

    async fn forward(&self, event: InputEvent) -> bool {
        self.input.send(event).await.is_ok()
    }
}

// =============================================================================
// TESTS
// =============================================================================
