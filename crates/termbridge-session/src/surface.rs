//! Render surface seam and the two units of data crossing the bridge.

use async_trait::async_trait;
use termbridge_common::{SurfaceError, TermSize};
use tokio::sync::mpsc;

/// Bytes produced by the remote shell between two consecutive reads.
///
/// The bridge never parses or merges chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk(Vec<u8>);

impl OutputChunk {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for OutputChunk {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for OutputChunk {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for OutputChunk {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

/// Input emitted by the render surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Already-encoded key bytes (escape sequences included).
    Keystroke(Vec<u8>),
    Resize(TermSize),
    Paste(Vec<u8>),
}

impl InputEvent {
    pub fn keystroke(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Keystroke(bytes.into())
    }

    pub fn paste(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Paste(bytes.into())
    }

    pub fn resize(rows: u16, cols: u16) -> Self {
        Self::Resize(TermSize::new(rows, cols))
    }

    /// Bytes this event writes to the channel, if it is a pure data event.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Self::Keystroke(bytes) | Self::Paste(bytes) => Some(bytes),
            Self::Resize(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Keystroke(_) => "keystroke",
            Self::Resize(_) => "resize",
            Self::Paste(_) => "paste",
        }
    }
}

/// The surface's input event stream. Exactly one consumer may own it.
pub type InputStream = mpsc::Receiver<InputEvent>;

/// Display sink of an embedded terminal emulator.
///
/// The bridge only ever writes to it; input flows the other way through an
/// [`InputStream`] the surface hands over once.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// Display bytes. May suspend while the surface is busy; the bridge keeps
    /// queuing behind it. An error drops this write only.
    async fn write(&self, data: &[u8]) -> Result<(), SurfaceError>;
}
