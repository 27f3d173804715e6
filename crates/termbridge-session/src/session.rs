//! Session record and the lightweight handle returned by `connect`.

use chrono::{DateTime, Utc};
use termbridge_common::{EventBus, SessionEvent, SessionId, SessionState, TermSize};
use tokio::sync::{broadcast, watch};

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub state: SessionState,
    pub size: TermSize,
    pub last_activity: DateTime<Utc>,
    /// Label of the current (or most recent) channel.
    pub label: String,
    /// Number of channels bound over the session's lifetime.
    pub connects: u32,
}

impl Session {
    /// Window title in the form `label - COLSxROWS`.
    pub fn title(&self) -> String {
        if self.label.is_empty() {
            return self.size.to_string();
        }
        format!("{} - {}", self.label, self.size)
    }
}

/// Cloneable observer of a session's lifecycle.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    state: watch::Receiver<SessionState>,
    events: EventBus,
}

impl SessionHandle {
    pub(crate) fn new(
        id: SessionId,
        state: watch::Receiver<SessionState>,
        events: EventBus,
    ) -> Self {
        Self { id, state, events }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Wait until the session reaches `target`. Returns `false` if the
    /// session was dropped first.
    pub async fn wait_for(&self, target: SessionState) -> bool {
        let mut state = self.state.clone();
        // Bound first: the `watch::Ref` would otherwise outlive `state`.
        let reached = state.wait_for(|s| *s == target).await.is_ok();
        reached
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
