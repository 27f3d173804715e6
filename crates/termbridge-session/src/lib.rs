//! Session bridge between a remote interactive shell and a terminal render
//! surface.
//!
//! A [`SessionBridge`] owns one logical terminal session. Output read from a
//! [`TransportChannel`] is queued in order and written to a
//! [`RenderSurface`]; input events emitted by the surface are written back to
//! the channel in the order they were generated. The bridge never takes input
//! from anywhere except the surface's own event stream, attached once with
//! [`SessionBridge::attach_input`].
//!
//! Transport failures never escape the forwarding loops as errors: they move
//! the session to [`SessionState::Disconnected`] and publish a
//! [`SessionEvent`]. Whether and when to reconnect is left to the caller.

pub mod bridge;
pub mod error;
pub mod output;
pub mod session;
pub mod surface;
pub mod transport;

pub use bridge::SessionBridge;
pub use error::{AttachError, ConnectError, DisconnectError, ForwardError};
pub use session::{Session, SessionHandle};
pub use surface::{InputEvent, InputStream, OutputChunk, RenderSurface};
pub use transport::{ChannelReader, ChannelWriter, TransportChannel};

pub use termbridge_common::{
    DisconnectReason, SessionEvent, SessionId, SessionState, SurfaceError, TermSize,
    TransportError,
};
