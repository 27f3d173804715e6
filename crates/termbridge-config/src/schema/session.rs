//! Session bridge settings: initial geometry, buffering, and notifications.

use serde::{Deserialize, Serialize};

/// Settings injected into every session bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Rows used when the surface has not reported a size (valid range: 1-500).
    pub default_rows: u16,
    /// Columns used when the surface has not reported a size (valid range: 1-500).
    pub default_cols: u16,
    /// Output chunks buffered ahead of the render surface before reads from
    /// the channel pause (valid range: 1-4096).
    pub output_queue_depth: u32,
    /// Bytes of already-displayed output kept for repainting a reloaded
    /// surface. Zero disables the transcript (valid range: 0-16 MiB).
    pub transcript_bytes: u32,
    /// Capacity of the session event bus (valid range: 1-1024).
    pub event_capacity: u32,
    /// Write "Connection to <host> closed." to the surface when the remote
    /// side ends the channel.
    pub closed_banner: bool,
    /// How long `disconnect()` waits for queued output to reach the surface
    /// before closing the channel anyway (valid range: 0-60000).
    pub flush_timeout_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_rows: 24,
            default_cols: 80,
            output_queue_depth: 64,
            transcript_bytes: 256 * 1024,
            event_capacity: 64,
            closed_banner: true,
            flush_timeout_ms: 2_000,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
