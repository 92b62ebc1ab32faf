//! Connection table and room membership.
//!
//! [`RoomRegistry`] owns every live connection's outbound queue and the
//! mapping from room name to member set. Fan-out happens under the read
//! lock with non-blocking `try_send`, so a slow or dead recipient never
//! holds up delivery to the others.

use std::collections::{BTreeMap, HashMap, HashSet};

use tokio::sync::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::relay_event::{Outbound, Scope};
use super::ConnectionId;
use crate::error::RelayError;

/// One registered connection.
#[derive(Debug)]
struct ConnectionEntry {
    outbound: mpsc::Sender<Outbound>,
    rooms: HashSet<String>,
}

#[derive(Debug, Default)]
struct RegistryState {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<String, HashSet<ConnectionId>>,
}

/// Result of fanning one frame out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Recipients whose queue accepted the frame.
    pub delivered: usize,
    /// Recipients skipped because their queue was full or closed.
    pub dropped: usize,
}

/// Registry of live connections and the rooms they belong to.
///
/// # Concurrency
///
/// A single `RwLock` guards both maps so a connection's room set and the
/// room's member set always agree.
///
/// - `register`, `join`, `leave`, `unregister` take the write lock.
/// - `deliver` and the read accessors take the read lock, so publishes
///   from different connections run concurrently.
///
/// A join or leave applies to every `deliver` that starts after it
/// returns.
#[derive(Debug)]
pub struct RoomRegistry {
    state: RwLock<RegistryState>,
    queue_capacity: usize,
}

impl RoomRegistry {
    /// Creates an empty registry whose connections get outbound queues of
    /// `queue_capacity` frames (at least one).
    #[must_use]
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Registers a new connection with no room memberships.
    ///
    /// The returned receiver is the connection's outbound queue. Dropping
    /// it makes later deliveries to this connection count as dropped.
    pub async fn register(&self) -> (ConnectionId, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let id = ConnectionId::new();
        let mut state = self.state.write().await;
        state.connections.insert(
            id,
            ConnectionEntry {
                outbound: tx,
                rooms: HashSet::new(),
            },
        );
        (id, rx)
    }

    /// Adds a connection to a room. Returns `true` if it was not already a
    /// member.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ConnectionNotFound`] if `id` is not
    /// registered.
    pub async fn join(&self, id: ConnectionId, room: &str) -> Result<bool, RelayError> {
        let mut state = self.state.write().await;
        let entry = state
            .connections
            .get_mut(&id)
            .ok_or(RelayError::ConnectionNotFound(id))?;
        if !entry.rooms.insert(room.to_string()) {
            return Ok(false);
        }
        state.rooms.entry(room.to_string()).or_default().insert(id);
        Ok(true)
    }

    /// Removes a connection from a room. Returns `true` if it was a member.
    /// Empty rooms are pruned.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ConnectionNotFound`] if `id` is not
    /// registered.
    pub async fn leave(&self, id: ConnectionId, room: &str) -> Result<bool, RelayError> {
        let mut state = self.state.write().await;
        let entry = state
            .connections
            .get_mut(&id)
            .ok_or(RelayError::ConnectionNotFound(id))?;
        if !entry.rooms.remove(room) {
            return Ok(false);
        }
        remove_member(&mut state.rooms, room, id);
        Ok(true)
    }

    /// Drops a connection and its membership in every room. Returns
    /// `false` if it was already gone.
    ///
    /// The connection's outbound sender is dropped here, so its receiver
    /// drains whatever is still queued and then ends.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let mut state = self.state.write().await;
        let Some(entry) = state.connections.remove(&id) else {
            return false;
        };
        for room in &entry.rooms {
            remove_member(&mut state.rooms, room, id);
        }
        true
    }

    /// Queues `frame` for every connection in `scope`.
    ///
    /// Never waits on a recipient. A full queue drops the frame for that
    /// recipient only.
    pub async fn deliver(&self, scope: Scope<'_>, frame: &Outbound) -> Delivery {
        let state = self.state.read().await;
        let mut delivery = Delivery::default();
        match scope {
            Scope::Room(room) => {
                let Some(members) = state.rooms.get(room) else {
                    return delivery;
                };
                for id in members {
                    if let Some(entry) = state.connections.get(id) {
                        offer(*id, entry, frame, &mut delivery);
                    }
                }
            }
            Scope::All => {
                for (id, entry) in &state.connections {
                    offer(*id, entry, frame, &mut delivery);
                }
            }
        }
        delivery
    }

    /// Returns `true` if `id` is currently a member of `room`.
    pub async fn is_member(&self, id: ConnectionId, room: &str) -> bool {
        let state = self.state.read().await;
        state
            .rooms
            .get(room)
            .is_some_and(|members| members.contains(&id))
    }

    /// Returns `true` if `id` is registered.
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.state.read().await.connections.contains_key(&id)
    }

    /// Returns the members of `room`, empty if the room does not exist.
    pub async fn room_members(&self, room: &str) -> Vec<ConnectionId> {
        let state = self.state.read().await;
        state
            .rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the rooms `id` belongs to, sorted.
    pub async fn rooms_of(&self, id: ConnectionId) -> Vec<String> {
        let state = self.state.read().await;
        let mut rooms: Vec<String> = state
            .connections
            .get(&id)
            .map(|entry| entry.rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    /// Returns the member count of every non-empty room.
    pub async fn room_sizes(&self) -> BTreeMap<String, usize> {
        let state = self.state.read().await;
        state
            .rooms
            .iter()
            .map(|(name, members)| (name.clone(), members.len()))
            .collect()
    }

    /// Returns the number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }
}

fn remove_member(rooms: &mut HashMap<String, HashSet<ConnectionId>>, room: &str, id: ConnectionId) {
    if let Some(members) = rooms.get_mut(room) {
        members.remove(&id);
        if members.is_empty() {
            rooms.remove(room);
        }
    }
}

fn offer(id: ConnectionId, entry: &ConnectionEntry, frame: &Outbound, delivery: &mut Delivery) {
    match entry.outbound.try_send(std::sync::Arc::clone(frame)) {
        Ok(()) => delivery.delivered += 1,
        Err(TrySendError::Full(_)) => {
            tracing::warn!(connection = %id, event = frame.event, "outbound queue full, dropping frame");
            delivery.dropped += 1;
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!(connection = %id, event = frame.event, "recipient gone, dropping frame");
            delivery.dropped += 1;
        }
    }
}
