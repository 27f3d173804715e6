use termbridge_common::{DisconnectReason, SessionState, TermSize, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("session already has a live channel")]
    AlreadyConnected,

    #[error("transport refused the channel: {0}")]
    ChannelRejected(#[source] TransportError),

    #[error("cannot bind a channel while the session is {0}")]
    InvalidState(SessionState),

    #[error("invalid terminal size {0}")]
    InvalidSize(TermSize),
}

/// Only raised when releasing the channel itself fails. The session still
/// ends up `Closed`.
#[derive(Debug, thiserror::Error)]
pub enum DisconnectError {
    #[error("failed to release channel: {0}")]
    Release(#[source] TransportError),
}

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("session is {0}, not forwarding")]
    Inactive(SessionState),

    #[error("invalid terminal size {0}")]
    InvalidSize(TermSize),

    #[error("channel lost while forwarding: {0}")]
    LinkLost(DisconnectReason),

    #[error("output queue closed")]
    QueueClosed,
}

#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("an input stream is already attached to this session")]
    AlreadyAttached,
}
