//! Browser wire protocol.
//!
//! Output travels server → client as binary frames of raw terminal bytes.
//! Everything else is a JSON text frame tagged by `type`.

use serde::{Deserialize, Serialize};
use termbridge_session::{InputEvent, SessionState};
use tokio_tungstenite::tungstenite::Message;

/// Messages the browser terminal sends.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "input")]
    Input { data: String },

    #[serde(rename = "paste")]
    Paste { data: String },

    #[serde(rename = "resize")]
    Resize { rows: u16, cols: u16 },

    /// Start a fresh shell after the previous one ended.
    #[serde(rename = "reconnect")]
    Reconnect,

    /// Resend retained output, e.g. after a page reload.
    #[serde(rename = "repaint")]
    Repaint,
}

impl ClientMessage {
    /// The input event this message carries, if any.
    pub fn into_input(self) -> Option<InputEvent> {
        match self {
            Self::Input { data } => Some(InputEvent::Keystroke(data.into_bytes())),
            Self::Paste { data } => Some(InputEvent::Paste(data.into_bytes())),
            Self::Resize { rows, cols } => Some(InputEvent::resize(rows, cols)),
            Self::Reconnect | Self::Repaint => None,
        }
    }
}

/// Messages the server sends back as text frames.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "session_ready")]
    SessionReady { session_id: String },

    #[serde(rename = "state")]
    State { state: SessionState, title: String },

    #[serde(rename = "disconnected")]
    Disconnected { reason: String },

    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    pub fn to_frame(&self) -> Option<Message> {
        match serde_json::to_string(self) {
            Ok(json) => Some(Message::Text(json.into())),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode server message");
                None
            }
        }
    }
}
