use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a terminal session.
///
/// `Idle -> Active -> {Closing -> Closed, Disconnected}`,
/// `Disconnected -> Active` (reconnect) or `Disconnected -> Closed`,
/// `Closed -> Active` (reconnect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Active,
    Closing,
    Closed,
    Disconnected,
}

impl SessionState {
    /// A live channel is bound (or being torn down).
    pub fn is_live(self) -> bool {
        matches!(self, Self::Active | Self::Closing)
    }

    /// States from which a fresh channel may be bound via reconnect.
    pub fn can_reconnect(self) -> bool {
        matches!(self, Self::Disconnected | Self::Closed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermSize {
    pub rows: u16,
    pub cols: u16,
}

impl TermSize {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    /// Zero rows or columns cannot be applied to a pty.
    pub fn is_valid(self) -> bool {
        self.rows > 0 && self.cols > 0
    }
}

impl Default for TermSize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

impl fmt::Display for TermSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}
