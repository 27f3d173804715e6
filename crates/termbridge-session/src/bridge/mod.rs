//! The session bridge: lifecycle state machine plus the two forwarding paths.
//!
//! All lifecycle transitions happen while holding the link slot lock, so
//! `connect`, `reconnect`, `disconnect`, input forwarding and loss handling
//! observe a consistent state. The output path only takes that lock when the
//! channel is lost. No wait on the output queue happens under that lock
//! without the flush deadline around it.

mod forward;
mod lifecycle;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use termbridge_common::{EventBus, SessionEvent, SessionId, SessionState, TermSize};
use termbridge_config::BridgeConfig;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::output::{spawn_output_pump, OutputItem};
use crate::session::{Session, SessionHandle};
use crate::surface::RenderSurface;
use crate::transport::ChannelWriter;

// =============================================================================
// TYPES
// =============================================================================

/// The currently bound channel. At most one exists per session.
struct Link {
    writer: Box<dyn ChannelWriter>,
    /// Cancels this link's reader task.
    cancel: CancellationToken,
    generation: u64,
}

#[derive(Default)]
struct LinkSlot {
    link: Option<Link>,
    /// Bumped on every bind so a stale reader cannot tear down a newer link.
    generation: u64,
    /// The most recent reader task. It may outlive its link while it queues
    /// the closed banner, so it is joined before anything else is queued.
    reader: Option<JoinHandle<()>>,
    label: String,
    connects: u32,
}

struct Inner {
    id: SessionId,
    config: Arc<BridgeConfig>,
    slot: tokio::sync::Mutex<LinkSlot>,
    state: watch::Sender<SessionState>,
    /// Mutated by resize input and read on reconnect.
    size: Mutex<TermSize>,
    last_activity: Mutex<DateTime<Utc>>,
    events: EventBus,
    output: mpsc::Sender<OutputItem>,
    /// Parent of every link token; cancelled when the bridge is dropped.
    shutdown: CancellationToken,
    /// Copy of the live link's token, reachable without the slot lock so
    /// `disconnect` can interrupt a pending channel write.
    link_cancel: Mutex<CancellationToken>,
    input_attached: AtomicBool,
}

/// Owns one terminal session and bridges it between a transport channel and
/// a render surface.
///
/// Must be created inside a tokio runtime: construction spawns the task that
/// drains output into the surface.
pub struct SessionBridge {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// CONSTRUCTION / ACCESSORS
// =============================================================================

impl SessionBridge {
    /// Create an idle session writing to `surface`.
    pub fn new(config: Arc<BridgeConfig>, surface: Arc<dyn RenderSurface>) -> Self {
        let id = SessionId::new();
        let session = &config.session;
        let events = EventBus::new(session.event_capacity as usize);
        let output = spawn_output_pump(
            surface,
            session.output_queue_depth as usize,
            session.transcript_bytes as usize,
            events.clone(),
            id.short().to_string(),
        );
        let size = TermSize::new(session.default_rows, session.default_cols);
        let (state, _) = watch::channel(SessionState::Idle);

        tracing::debug!(session = %id.short(), %size, "Session created");

        Self {
            inner: Arc::new(Inner {
                id,
                config,
                slot: tokio::sync::Mutex::new(LinkSlot::default()),
                state,
                size: Mutex::new(size),
                last_activity: Mutex::new(Utc::now()),
                events,
                output,
                shutdown: CancellationToken::new(),
                link_cancel: Mutex::new(CancellationToken::new()),
                input_attached: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.inner.id
    }

    pub fn state(&self) -> SessionState {
        self.inner.state()
    }

    pub fn size(&self) -> TermSize {
        *lock(&self.inner.size)
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        *lock(&self.inner.last_activity)
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(
            self.inner.id.clone(),
            self.inner.state.subscribe(),
            self.inner.events.clone(),
        )
    }

    /// Snapshot of the session record.
    pub async fn session(&self) -> Session {
        let slot = self.inner.slot.lock().await;
        Session {
            id: self.inner.id.clone(),
            state: self.state(),
            size: self.size(),
            last_activity: self.last_activity(),
            label: slot.label.clone(),
            connects: slot.connects,
        }
    }
}

impl Drop for SessionBridge {
    fn drop(&mut self) {
        // Stops the reader and input tasks; the output task then ends once
        // the last sender goes away.
        self.inner.shutdown.cancel();
        if self.state().is_live() {
            tracing::debug!(session = %self.inner.id.short(), "Session dropped while live");
        }
    }
}

// =============================================================================
// SHARED STATE
// =============================================================================

impl Inner {
    fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    fn set_state(&self, to: SessionState) {
        let from = self.state.send_replace(to);
        if from != to {
            tracing::info!(session = %self.id.short(), %from, %to, "Session state changed");
            self.events.publish(SessionEvent::StateChanged { from, to });
        }
    }

    fn touch(&self) {
        *lock(&self.last_activity) = Utc::now();
    }

    fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.config.session.flush_timeout_ms.into())
    }
}
