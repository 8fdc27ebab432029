//! Persistent-channel bookkeeping for SSE sessions and the line channel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    AwaitingResult,
    Closed,
}

/// Tracks in-flight calls on one channel. Once closed, nothing is delivered.
#[derive(Debug, Default)]
pub struct ChannelTracker {
    in_flight: usize,
    closed: bool,
}

impl ChannelTracker {
    pub fn state(&self) -> ChannelState {
        if self.closed {
            ChannelState::Closed
        } else if self.in_flight > 0 {
            ChannelState::AwaitingResult
        } else {
            ChannelState::Idle
        }
    }

    /// Register a call. Returns `false` if the channel is already closed.
    pub fn begin(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.in_flight += 1;
        true
    }

    /// Complete a call. Returns whether its result may still be delivered.
    pub fn finish(&mut self) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        !self.closed
    }

    pub fn close(&mut self) {
        self.closed = true;
        self.in_flight = 0;
    }
}

/// Handle to one open SSE session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub sender: mpsc::Sender<String>,
    pub token: CancellationToken,
    pub tracker: Arc<Mutex<ChannelTracker>>,
}

impl Session {
    pub fn state(&self) -> ChannelState {
        self.tracker
            .lock()
            .map(|t| t.state())
            .unwrap_or(ChannelState::Closed)
    }

    pub fn begin(&self) -> bool {
        self.tracker.lock().map(|mut t| t.begin()).unwrap_or(false)
    }

    pub fn finish(&self) -> bool {
        self.tracker.lock().map(|mut t| t.finish()).unwrap_or(false)
    }

    fn close(&self) {
        if let Ok(mut t) = self.tracker.lock() {
            t.close();
        }
        self.token.cancel();
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session; the receiver feeds the client's event stream.
    pub fn open(&self, buffer: usize) -> (Session, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(buffer);
        let session = Session {
            id: Uuid::new_v4(),
            sender,
            token: CancellationToken::new(),
            tracker: Arc::new(Mutex::new(ChannelTracker::default())),
        };
        if let Ok(mut map) = self.sessions.write() {
            map.insert(session.id, session.clone());
        }
        (session, receiver)
    }

    pub fn get(&self, id: &Uuid) -> Option<Session> {
        self.sessions.read().ok()?.get(id).cloned()
    }

    /// Remove and close a session; in-flight calls are cancelled.
    pub fn close(&self, id: &Uuid) {
        let removed = self.sessions.write().ok().and_then(|mut m| m.remove(id));
        if let Some(session) = removed {
            session.close();
            tracing::info!(session_id = %id, "sse session closed");
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Closes its session when the client's event stream is dropped.
pub(crate) struct SessionGuard {
    pub id: Uuid,
    pub registry: SessionRegistry,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.close(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_state_machine() {
        let mut t = ChannelTracker::default();
        assert_eq!(t.state(), ChannelState::Idle);
        assert!(t.begin());
        assert_eq!(t.state(), ChannelState::AwaitingResult);
        assert!(t.finish());
        assert_eq!(t.state(), ChannelState::Idle);
        assert!(t.begin());
        t.close();
        assert_eq!(t.state(), ChannelState::Closed);
        assert!(!t.finish());
        assert!(!t.begin());
    }

    #[test]
    fn closing_cancels_the_session_token() {
        let registry = SessionRegistry::new();
        let (session, _rx) = registry.open(4);
        assert_eq!(registry.len(), 1);
        registry.close(&session.id);
        assert!(session.token.is_cancelled());
        assert_eq!(session.state(), ChannelState::Closed);
        assert!(registry.get(&session.id).is_none());
    }
}
