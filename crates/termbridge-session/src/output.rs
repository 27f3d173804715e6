//! Output path: a bounded queue between the channel reader and the render
//! surface, drained by a single task so chunks reach the surface in order.
//!
//! When the surface is slower than the remote shell the queue fills, the
//! reader's `send` suspends, and reads from the channel pause. Nothing is
//! dropped on the way.

use std::collections::VecDeque;
use std::sync::Arc;

use termbridge_common::{EventBus, SessionEvent};
use tokio::sync::{mpsc, oneshot};

use crate::surface::{OutputChunk, RenderSurface};

// =============================================================================
// TRANSCRIPT
// =============================================================================

/// Bounded history of output already sent to the surface.
///
/// Oldest bytes are evicted first. A capacity of zero keeps nothing.
#[derive(Debug)]
pub struct Transcript {
    bytes: VecDeque<u8>,
    capacity: usize,
}

impl Transcript {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, data: &[u8]) {
        if self.capacity == 0 {
            return;
        }
        if data.len() >= self.capacity {
            self.bytes.clear();
            self.bytes.extend(&data[data.len() - self.capacity..]);
            return;
        }
        let overflow = (self.bytes.len() + data.len()).saturating_sub(self.capacity);
        self.bytes.drain(..overflow);
        self.bytes.extend(data);
    }

    pub fn snapshot(&self) -> Vec<u8> {
        self.bytes.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// =============================================================================
// QUEUE
// =============================================================================

pub(crate) enum OutputItem {
    Chunk(OutputChunk),
    /// Rewrite the transcript to the surface without recording it again.
    Repaint,
    /// Acknowledged once every item queued before it has been handled.
    Flush(oneshot::Sender<()>),
}

/// Spawn the drain task. It ends when every sender is dropped.
pub(crate) fn spawn_output_pump(
    surface: Arc<dyn RenderSurface>,
    depth: usize,
    transcript_bytes: usize,
    events: EventBus,
    session: String,
) -> mpsc::Sender<OutputItem> {
    let (tx, rx) = mpsc::channel(depth.max(1));
    tokio::spawn(drain(
        rx,
        surface,
        Transcript::new(transcript_bytes),
        events,
        session,
    ));
    tx
}

async fn drain(
    mut rx: mpsc::Receiver<OutputItem>,
    surface: Arc<dyn RenderSurface>,
    mut transcript: Transcript,
    events: EventBus,
    session: String,
) {
    while let Some(item) = rx.recv().await {
        match item {
            OutputItem::Chunk(chunk) => {
                // Recorded even if the write fails so a repaint can restore it.
                transcript.push(chunk.as_bytes());
                if let Err(e) = surface.write(chunk.as_bytes()).await {
                    tracing::warn!(session = %session, error = %e, bytes = chunk.len(), "Surface write failed, skipping chunk");
                    events.publish(SessionEvent::SurfaceWriteFailed {
                        error: e.to_string(),
                    });
                }
            }
            OutputItem::Repaint => {
                if transcript.is_empty() {
                    continue;
                }
                let history = transcript.snapshot();
                tracing::debug!(session = %session, bytes = history.len(), "Repainting surface");
                if let Err(e) = surface.write(&history).await {
                    tracing::warn!(session = %session, error = %e, "Surface repaint failed");
                    events.publish(SessionEvent::SurfaceWriteFailed {
                        error: e.to_string(),
                    });
                }
            }
            OutputItem::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    tracing::debug!(session = %session, "Output queue closed");
}

// =============================================================================
// TESTS
// =============================================================================
