use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures reported by a transport channel (the remote shell side).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("channel rejected: {0}")]
    Rejected(String),

    #[error("channel closed")]
    Closed,
}

/// Failures reported by a render surface (the display side).
#[derive(Debug, Clone, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface rejected write: {0}")]
    Rejected(String),

    #[error("surface closed")]
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
