//! Transport channel seam: the already-authenticated byte channel to a
//! remote interactive shell.
//!
//! A channel is started once, then split into a reader half driven by the
//! bridge's output loop and a writer half shared by the input path and the
//! lifecycle operations. The two halves are used concurrently.

use async_trait::async_trait;
use termbridge_common::{TermSize, TransportError};

/// An unbound channel handed to `connect` or `reconnect`.
#[async_trait]
pub trait TransportChannel: Send {
    /// Human-readable peer name, e.g. `user@host`.
    fn label(&self) -> String;

    /// Open the remote shell. An error here means the channel was rejected
    /// and is never bound to a session.
    async fn start(&mut self) -> Result<(), TransportError>;

    fn split(self: Box<Self>) -> (Box<dyn ChannelReader>, Box<dyn ChannelWriter>);
}

#[async_trait]
pub trait ChannelReader: Send {
    /// Wait for the next bytes from the remote shell.
    ///
    /// `Ok(None)` is a clean end of stream, distinct from an error. The future
    /// is dropped when the session is cancelled, so implementations must not
    /// lose data that was already read when that happens.
    ///
    /// Bytes returned just before a cancellation are still queued for the
    /// surface, unless the queue stays full past the flush timeout.
    async fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}

#[async_trait]
pub trait ChannelWriter: Send {
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    async fn resize(&mut self, size: TermSize) -> Result<(), TransportError>;

    /// Release the channel. Called exactly once per bound channel.
    async fn close(&mut self) -> Result<(), TransportError>;
}
