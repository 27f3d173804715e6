//! The two forwarding paths.
//!
//! Output: channel reader -> bounded queue -> surface (see `output`).
//! Input: surface event stream -> channel writer, one event at a time.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use termbridge_common::{DisconnectReason, SessionEvent, SessionState};
use tokio_util::sync::CancellationToken;

use super::{lock, Inner, SessionBridge};
use crate::error::{AttachError, ForwardError};
use crate::output::OutputItem;
use crate::surface::{InputEvent, InputStream, OutputChunk};
use crate::transport::ChannelReader;

// =============================================================================
// OUTPUT (CHANNEL -> SURFACE)
// =============================================================================

impl SessionBridge {
    /// Queue a chunk for the render surface, unmodified.
    ///
    /// Suspends only while the output queue is full. Rejected unless a
    /// channel is bound.
    pub async fn on_output(&self, chunk: OutputChunk) -> Result<(), ForwardError> {
        let state = self.inner.state();
        if !state.is_live() {
            return Err(ForwardError::Inactive(state));
        }
        self.inner.touch();
        if self.inner.enqueue(chunk).await {
            Ok(())
        } else {
            Err(ForwardError::QueueClosed)
        }
    }

    /// Rewrite the retained transcript to the surface, e.g. after the surface
    /// reloaded and lost its contents.
    pub async fn repaint(&self) -> Result<(), ForwardError> {
        self.inner
            .output
            .send(OutputItem::Repaint)
            .await
            .map_err(|_| ForwardError::QueueClosed)
    }
}

impl Inner {
    /// Returns `false` if the output task is gone.
    pub(super) async fn enqueue(&self, chunk: OutputChunk) -> bool {
        if self.output.send(OutputItem::Chunk(chunk)).await.is_err() {
            tracing::debug!(session = %self.id.short(), "Output queue closed, chunk not delivered");
            return false;
        }
        true
    }

    /// Like `enqueue`, but gives up after the flush timeout. Used where a
    /// stalled surface must not hold up the caller.
    pub(super) async fn enqueue_bounded(&self, chunk: OutputChunk) -> bool {
        let sent = tokio::time::timeout(self.flush_timeout(), self.enqueue(chunk)).await;
        match sent {
            Ok(delivered) => delivered,
            Err(_) => {
                tracing::warn!(session = %self.id.short(), "Output queue stalled, chunk dropped");
                false
            }
        }
    }
}

/// Per-link reader task. Ends on EOF, on error, or when the link is
/// cancelled.
pub(super) async fn read_loop(
    inner: Arc<Inner>,
    mut reader: Box<dyn ChannelReader>,
    cancel: CancellationToken,
    generation: u64,
) {
    loop {
        let received = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            received = reader.receive() => received,
        };

        match received {
            Ok(Some(bytes)) => {
                if bytes.is_empty() {
                    continue;
                }
                inner.touch();
                // A full queue suspends here, which pauses reading upstream.
                let queued = tokio::select! {
                    biased;
                    permit = inner.output.reserve() => match permit {
                        Ok(permit) => {
                            permit.send(OutputItem::Chunk(OutputChunk::from(bytes)));
                            true
                        }
                        Err(_) => false,
                    },
                    // Already taken from the channel: deliver within the
                    // flush deadline, then stop.
                    _ = cancel.cancelled() => {
                        inner.enqueue_bounded(OutputChunk::from(bytes)).await;
                        break;
                    }
                };
                if !queued {
                    tracing::debug!(session = %inner.id.short(), "Output queue closed, reader stopping");
                    break;
                }
            }
            Ok(None) => {
                inner
                    .link_lost(generation, DisconnectReason::Eof, &cancel)
                    .await;
                break;
            }
            Err(e) => {
                inner
                    .link_lost(
                        generation,
                        DisconnectReason::ReadFailed(e.to_string()),
                        &cancel,
                    )
                    .await;
                break;
            }
        }
    }
    tracing::debug!(session = %inner.id.short(), generation, "Reader stopped");
}

// =============================================================================
// INPUT (SURFACE -> CHANNEL)
// =============================================================================

impl SessionBridge {
    /// Apply one input event to the channel.
    ///
    /// Keystrokes and pastes are written as raw bytes. A resize updates the
    /// session dimensions, then resizes the channel. Rejected with
    /// `ForwardError::Inactive` unless the session is `Active`.
    pub async fn on_input(&self, event: InputEvent) -> Result<(), ForwardError> {
        self.inner.forward_input(event).await
    }

    /// Make this session the sole consumer of the surface's input stream.
    ///
    /// Events are applied in order by a background task until the stream
    /// ends or the bridge is dropped.
    pub fn attach_input(&self, mut input: InputStream) -> Result<(), AttachError> {
        if self.inner.input_attached.swap(true, Ordering::SeqCst) {
            return Err(AttachError::AlreadyAttached);
        }

        let inner = Arc::clone(&self.inner);
        let shutdown = inner.shutdown.clone();
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    event = input.recv() => event,
                };
                let Some(event) = event else {
                    break;
                };
                let kind = event.kind();
                if let Err(e) = inner.forward_input(event).await {
                    tracing::debug!(session = %inner.id.short(), kind, error = %e, "Input event dropped");
                }
            }
            tracing::debug!(session = %inner.id.short(), "Input stream ended");
        });
        Ok(())
    }
}

impl Inner {
    async fn forward_input(&self, event: InputEvent) -> Result<(), ForwardError> {
        let mut slot = self.slot.lock().await;
        let state = self.state();
        let link = match slot.link.as_mut() {
            Some(link) if state == SessionState::Active => link,
            _ => return Err(ForwardError::Inactive(state)),
        };

        // Fired by `disconnect` without the slot lock, so a stuck write
        // cannot keep it waiting.
        let cancel = link.cancel.clone();
        let result = match event {
            InputEvent::Keystroke(bytes) | InputEvent::Paste(bytes) => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ForwardError::Inactive(SessionState::Closing)),
                sent = link.writer.send(&bytes) => sent,
            },
            InputEvent::Resize(size) => {
                if !size.is_valid() {
                    return Err(ForwardError::InvalidSize(size));
                }
                *lock(&self.size) = size;
                self.events.publish(SessionEvent::Resized(size));
                let resized = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ForwardError::Inactive(SessionState::Closing)),
                    resized = link.writer.resize(size) => resized,
                };
                if let Err(e) = resized {
                    // The shell keeps running at the old size; not worth a disconnect.
                    tracing::warn!(session = %self.id.short(), %size, error = %e, "Channel resize failed");
                } else {
                    tracing::debug!(session = %self.id.short(), %size, "Channel resized");
                }
                Ok(())
            }
        };

        if let Err(e) = result {
            let reason = DisconnectReason::WriteFailed(e.to_string());
            self.drop_link(&mut slot, reason.clone()).await;
            return Err(ForwardError::LinkLost(reason));
        }
        self.touch();
        Ok(())
    }
}
