//! Long-polling sessions.
//!
//! Clients that cannot upgrade to a WebSocket hold a [`PollSession`]
//! instead: the outbound queue receiver lives here and each `GET` drains
//! it. Sessions that stop polling are found by [`PollSessions::idle`] and
//! disconnected by the sweeper.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::time::Instant;

use super::ConnectionId;
use super::relay_event::Outbound;
use crate::error::RelayError;

/// One polling client's outbound queue and liveness clock.
#[derive(Debug)]
pub struct PollSession {
    id: ConnectionId,
    outbound: Mutex<mpsc::Receiver<Outbound>>,
    last_seen: Mutex<Instant>,
}

impl PollSession {
    /// Wraps the receiver returned by the relay on connect.
    #[must_use]
    pub fn new(id: ConnectionId, outbound: mpsc::Receiver<Outbound>) -> Self {
        Self {
            id,
            outbound: Mutex::new(outbound),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    /// Connection this session belongs to.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Marks the session as active now.
    pub async fn touch(&self) {
        *self.last_seen.lock().await = Instant::now();
    }

    /// Waits up to `wait` for a first frame, then drains without waiting
    /// until `max` frames are collected. An empty result means the wait
    /// timed out.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ConnectionNotFound`] once the connection has
    /// been disconnected and its queue is drained.
    pub async fn poll(&self, wait: Duration, max: usize) -> Result<Vec<Outbound>, RelayError> {
        self.touch().await;
        let mut rx = self.outbound.lock().await;
        let mut frames = Vec::new();

        match tokio::time::timeout(wait, rx.recv()).await {
            Ok(Some(frame)) => frames.push(frame),
            Ok(None) => return Err(RelayError::ConnectionNotFound(self.id)),
            Err(_) => {}
        }
        while !frames.is_empty() && frames.len() < max.max(1) {
            match rx.try_recv() {
                Ok(frame) => frames.push(frame),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        drop(rx);

        self.touch().await;
        Ok(frames)
    }

    /// Returns `true` if the session is idle past `timeout` and no poll is
    /// in flight.
    pub async fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        // a held receiver lock means a GET is waiting right now
        if self.outbound.try_lock().is_err() {
            return false;
        }
        now.saturating_duration_since(*self.last_seen.lock().await) > timeout
    }
}

/// All open polling sessions, keyed by connection.
#[derive(Debug, Default)]
pub struct PollSessions {
    sessions: RwLock<HashMap<ConnectionId, Arc<PollSession>>>,
}

impl PollSessions {
    /// Creates an empty session table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session for a freshly connected client.
    pub async fn open(&self, id: ConnectionId, outbound: mpsc::Receiver<Outbound>) {
        let session = Arc::new(PollSession::new(id, outbound));
        self.sessions.write().await.insert(id, session);
    }

    /// Looks up a session.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ConnectionNotFound`] for unknown IDs.
    pub async fn get(&self, id: ConnectionId) -> Result<Arc<PollSession>, RelayError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RelayError::ConnectionNotFound(id))
    }

    /// Removes a session. Returns `true` if it existed.
    pub async fn close(&self, id: ConnectionId) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// IDs of sessions idle for longer than `timeout`.
    pub async fn idle(&self, timeout: Duration) -> Vec<ConnectionId> {
        let now = Instant::now();
        let sessions: Vec<Arc<PollSession>> = self.sessions.read().await.values().cloned().collect();
        let mut idle = Vec::new();
        for session in sessions {
            if session.is_idle(now, timeout).await {
                idle.push(session.id());
            }
        }
        idle
    }

    /// Number of open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no session is open.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
