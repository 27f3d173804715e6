//! A WebSocket client as the session's render surface.

use async_trait::async_trait;
use termbridge_common::SurfaceError;
use termbridge_session::RenderSurface;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Writes output as binary frames into the socket's outbound queue.
///
/// The queue is bounded, so a slow browser slows the session's output drain
/// instead of growing memory.
pub struct WsSurface {
    outbound: mpsc::Sender<Message>,
}

impl WsSurface {
    pub fn new(outbound: mpsc::Sender<Message>) -> Self {
        Self { outbound }
    }
}

#[async_trait]
impl RenderSurface for WsSurface {
    async fn write(&self, data: &[u8]) -> Result<(), SurfaceError> {
        self.outbound
            .send(Message::Binary(data.to_vec().into()))
            .await
            .map_err(|_| SurfaceError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn output_becomes_binary_frame() {
        let (tx, mut rx) = mpsc::channel(4);
        let surface = WsSurface::new(tx);
        surface.write(b"\x1b[1mhi").await.unwrap();

        match rx.recv().await {
            Some(Message::Binary(bytes)) => assert_eq!(&bytes[..], b"\x1b[1mhi"),
            other => panic!("expected binary frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_socket_is_reported() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let surface = WsSurface::new(tx);
        assert!(matches!(
            surface.write(b"x").await,
            Err(SurfaceError::Closed)
        ));
    }
}
