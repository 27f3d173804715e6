//! Lifecycle operations: connect, reconnect, disconnect, and link loss.

use std::sync::Arc;

use termbridge_common::{DisconnectReason, SessionEvent, SessionState, TermSize};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::forward::read_loop;
use super::{lock, Inner, Link, LinkSlot, SessionBridge};
use crate::error::{ConnectError, DisconnectError};
use crate::output::OutputItem;
use crate::session::SessionHandle;
use crate::surface::OutputChunk;
use crate::transport::TransportChannel;

// =============================================================================
// PUBLIC OPERATIONS
// =============================================================================

impl SessionBridge {
    /// Bind the first channel of an idle session and start forwarding.
    ///
    /// The channel is resized to `rows`x`cols` before any output is read.
    pub async fn connect<C>(
        &self,
        channel: C,
        rows: u16,
        cols: u16,
    ) -> Result<SessionHandle, ConnectError>
    where
        C: TransportChannel + 'static,
    {
        let size = TermSize::new(rows, cols);
        if !size.is_valid() {
            return Err(ConnectError::InvalidSize(size));
        }

        let mut slot = self.inner.slot.lock().await;
        if slot.link.is_some() {
            return Err(ConnectError::AlreadyConnected);
        }
        match self.inner.state() {
            SessionState::Idle => {}
            SessionState::Active | SessionState::Closing => {
                return Err(ConnectError::AlreadyConnected)
            }
            other => return Err(ConnectError::InvalidState(other)),
        }

        self.inner.bind(&mut slot, Box::new(channel), size).await?;
        *lock(&self.inner.size) = size;
        Ok(self.handle())
    }

    /// Bind a fresh channel after a failure or an explicit close.
    ///
    /// The last known dimensions are replayed to the new channel before any
    /// of its output is forwarded. Output from before the break is not
    /// replayed.
    pub async fn reconnect<C>(&self, channel: C) -> Result<SessionHandle, ConnectError>
    where
        C: TransportChannel + 'static,
    {
        let mut slot = self.inner.slot.lock().await;
        let state = self.inner.state();
        if slot.link.is_some() || state.is_live() {
            return Err(ConnectError::AlreadyConnected);
        }
        if !state.can_reconnect() {
            return Err(ConnectError::InvalidState(state));
        }

        let size = *lock(&self.inner.size);
        self.inner.bind(&mut slot, Box::new(channel), size).await?;
        Ok(self.handle())
    }

    /// Flush queued output, close the channel, and end in `Closed`.
    ///
    /// A pending channel write is abandoned. Waits on the output queue are
    /// bounded by `session.flush_timeout_ms`, so a stalled surface delays
    /// this call but cannot hang it. Calling this on a closed session
    /// succeeds without doing anything.
    pub async fn disconnect(&self) -> Result<(), DisconnectError> {
        // Cancelled before locking the slot: an input write may hold it.
        lock(&self.inner.link_cancel).cancel();

        let mut slot = self.inner.slot.lock().await;
        if self.inner.state() == SessionState::Closed {
            return Ok(());
        }

        let Some(mut link) = slot.link.take() else {
            self.inner.join_reader(&mut slot).await;
            self.inner.flush().await;
            self.inner.set_state(SessionState::Closed);
            return Ok(());
        };

        self.inner.set_state(SessionState::Closing);
        link.cancel.cancel();
        self.inner.join_reader(&mut slot).await;
        self.inner.flush().await;

        let result = link.writer.close().await.map_err(|e| {
            tracing::warn!(session = %self.inner.id.short(), error = %e, "Channel close failed");
            DisconnectError::Release(e)
        });
        self.inner.set_state(SessionState::Closed);
        result
    }
}

// =============================================================================
// INTERNALS
// =============================================================================

impl Inner {
    /// Start, split and size a channel, then install it as the live link.
    ///
    /// On any failure the channel is released and the session is unchanged.
    async fn bind(
        self: &Arc<Self>,
        slot: &mut LinkSlot,
        mut channel: Box<dyn TransportChannel>,
        size: TermSize,
    ) -> Result<(), ConnectError> {
        let label = channel.label();
        if let Err(e) = channel.start().await {
            tracing::warn!(session = %self.id.short(), %label, error = %e, "Channel rejected");
            return Err(ConnectError::ChannelRejected(e));
        }

        let (reader, mut writer) = channel.split();
        if let Err(e) = writer.resize(size).await {
            tracing::warn!(session = %self.id.short(), %label, error = %e, "Initial resize failed");
            if let Err(e) = writer.close().await {
                tracing::debug!(session = %self.id.short(), error = %e, "Close after rejected resize failed");
            }
            return Err(ConnectError::ChannelRejected(e));
        }

        // The previous reader may still be queueing its closed banner.
        self.join_reader(slot).await;

        slot.generation += 1;
        slot.connects += 1;
        slot.label = label;
        let generation = slot.generation;
        let cancel = self.shutdown.child_token();
        *lock(&self.link_cancel) = cancel.clone();
        slot.link = Some(Link {
            writer,
            cancel: cancel.clone(),
            generation,
        });

        tracing::info!(
            session = %self.id.short(),
            label = %slot.label,
            %size,
            connects = slot.connects,
            "Channel bound"
        );
        self.touch();
        self.set_state(SessionState::Active);
        slot.reader = Some(tokio::spawn(read_loop(
            Arc::clone(self),
            reader,
            cancel,
            generation,
        )));
        Ok(())
    }

    /// Called by a reader task when its channel ends. Ignored if that link
    /// was already replaced or closed.
    pub(super) async fn link_lost(
        &self,
        generation: u64,
        reason: DisconnectReason,
        cancel: &CancellationToken,
    ) {
        let mut slot = tokio::select! {
            biased;
            // Whoever cancelled the link also tears it down.
            _ = cancel.cancelled() => return,
            slot = self.slot.lock() => slot,
        };
        let current = slot.link.as_ref().map(|link| link.generation);
        if current != Some(generation) {
            tracing::debug!(session = %self.id.short(), generation, "Stale link loss ignored");
            return;
        }

        let show_banner =
            matches!(reason, DisconnectReason::Eof) && self.config.session.closed_banner;
        let label = slot.label.clone();
        self.drop_link(&mut slot, reason).await;
        drop(slot);

        if show_banner {
            let banner = format!("\r\nConnection to {label} closed.\r\n");
            self.enqueue_bounded(OutputChunk::from(banner.as_str())).await;
        }
    }

    /// Tear down the live link after a transport failure and move to
    /// `Disconnected`.
    pub(super) async fn drop_link(&self, slot: &mut LinkSlot, reason: DisconnectReason) {
        let Some(mut link) = slot.link.take() else {
            return;
        };
        link.cancel.cancel();
        if let Err(e) = link.writer.close().await {
            tracing::debug!(session = %self.id.short(), error = %e, "Close of lost channel failed");
        }

        match &reason {
            DisconnectReason::Eof => {
                tracing::info!(session = %self.id.short(), label = %slot.label, "Remote closed the channel");
            }
            other => {
                tracing::warn!(session = %self.id.short(), reason = %other, "Channel lost");
            }
        }

        self.set_state(SessionState::Disconnected);
        self.events.publish(SessionEvent::Disconnected { reason });
    }

    /// Wait for the last reader task to stop, at most the flush timeout.
    async fn join_reader(&self, slot: &mut LinkSlot) {
        let Some(mut reader) = slot.reader.take() else {
            return;
        };
        if tokio::time::timeout(self.flush_timeout(), &mut reader)
            .await
            .is_err()
        {
            tracing::warn!(session = %self.id.short(), "Reader did not stop in time");
            reader.abort();
        }
    }

    /// Wait until everything queued so far has reached the surface, or the
    /// flush timeout passes. The deadline covers queueing the marker too.
    pub(super) async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        let flushed = tokio::time::timeout(self.flush_timeout(), async {
            self.output.send(OutputItem::Flush(ack)).await.is_ok() && done.await.is_ok()
        })
        .await;
        if flushed.is_err() {
            tracing::warn!(session = %self.id.short(), "Output flush timed out");
        }
    }
}
