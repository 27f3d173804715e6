pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{BridgeError, ConfigError, SurfaceError, TransportError};
pub use events::{DisconnectReason, EventBus, SessionEvent};
pub use id::SessionId;
pub use types::{SessionState, TermSize};

pub type Result<T> = std::result::Result<T, BridgeError>;
