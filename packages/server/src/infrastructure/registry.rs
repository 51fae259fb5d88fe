//! Room Registry: which live sessions are subscribed to which group.
//!
//! The registry is the only piece of real-time session state. It references
//! sessions by id plus a clone of their outbound channel; the WebSocket
//! gateway owns the connection itself.
//!
//! Locking: the session map and the room map are held only for short,
//! non-blocking sections. Each room carries its own member lock and its own
//! delivery lock, so a slow store append in one group never stalls joins,
//! leaves or broadcasts in another. Lock order is always
//! sessions → rooms → room members.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use thiserror::Error;
use tokio::sync::{
    Mutex, OwnedMutexGuard, RwLock,
    mpsc::{self, error::TrySendError},
};

use crate::{
    domain::{GroupId, IdentityStore, RepositoryError, SessionId},
    infrastructure::dto::websocket::ServerMessage,
};

/// Outbound channel of one session. Bounded; a session whose queue is full
/// is dropped from the registry.
pub type SessionSender = mpsc::Sender<ServerMessage>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("group {0} not found")]
    GroupNotFound(GroupId),

    #[error("session {0} is not connected")]
    SessionNotRegistered(SessionId),

    #[error(transparent)]
    Store(RepositoryError),
}

struct SessionEntry {
    sender: SessionSender,
    groups: HashSet<GroupId>,
}

#[derive(Default)]
struct RoomEntry {
    members: Mutex<BTreeSet<SessionId>>,
    /// Serializes persist + fan-out within the group
    delivery: Arc<Mutex<()>>,
}

pub struct RoomRegistry {
    identity: Arc<dyn IdentityStore>,
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    rooms: RwLock<HashMap<GroupId, Arc<RoomEntry>>>,
}

impl RoomRegistry {
    pub fn new(identity: Arc<dyn IdentityStore>) -> Self {
        Self {
            identity,
            sessions: RwLock::new(HashMap::new()),
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Record a connected session's outbound channel.
    ///
    /// Re-registering an id replaces the channel and keeps its group set.
    pub async fn register_session(&self, session_id: SessionId, sender: SessionSender) {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session_id) {
            Some(entry) => entry.sender = sender,
            None => {
                sessions.insert(
                    session_id,
                    SessionEntry {
                        sender,
                        groups: HashSet::new(),
                    },
                );
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn is_registered(&self, session_id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    async fn room(&self, group_id: &GroupId) -> Arc<RoomEntry> {
        let existing = self.rooms.read().await.get(group_id).cloned();
        if let Some(room) = existing {
            return room;
        }
        self.rooms
            .write()
            .await
            .entry(group_id.clone())
            .or_default()
            .clone()
    }

    /// Drop a room nobody has joined, such as one whose delivery lock was
    /// taken for an unknown group id.
    async fn discard_empty_room(&self, group_id: &GroupId) {
        let mut rooms = self.rooms.write().await;
        let empty = match rooms.get(group_id) {
            Some(room) => room.members.lock().await.is_empty(),
            None => false,
        };
        if empty {
            rooms.remove(group_id);
        }
    }

    #[cfg(test)]
    pub(crate) async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Subscribe a session to a group's room.
    ///
    /// Idempotent: returns `Ok(false)` if the session was already joined.
    pub async fn join(
        &self,
        group_id: &GroupId,
        session_id: &SessionId,
    ) -> Result<bool, RegistryError> {
        match self.identity.get_group(group_id).await {
            Ok(_) => {}
            Err(RepositoryError::NotFound(_)) => {
                self.discard_empty_room(group_id).await;
                return Err(RegistryError::GroupNotFound(group_id.clone()));
            }
            Err(e) => return Err(RegistryError::Store(e)),
        }

        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(session_id)
            .ok_or_else(|| RegistryError::SessionNotRegistered(session_id.clone()))?;
        let room = self.room(group_id).await;
        let inserted = room.members.lock().await.insert(session_id.clone());
        entry.groups.insert(group_id.clone());
        Ok(inserted)
    }

    /// Unsubscribe a session from one group. No-op if it was not joined.
    pub async fn leave_group(&self, group_id: &GroupId, session_id: &SessionId) -> bool {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(session_id) {
            entry.groups.remove(group_id);
        }
        let room = self.rooms.read().await.get(group_id).cloned();
        match room {
            Some(room) => room.members.lock().await.remove(session_id),
            None => false,
        }
    }

    /// Forget a session entirely: every room membership and its channel.
    ///
    /// Returns the groups it had joined.
    pub async fn leave(&self, session_id: &SessionId) -> Vec<GroupId> {
        let mut sessions = self.sessions.write().await;
        let Some(entry) = sessions.remove(session_id) else {
            return Vec::new();
        };
        let rooms = self.rooms.read().await;
        for group_id in &entry.groups {
            if let Some(room) = rooms.get(group_id) {
                room.members.lock().await.remove(session_id);
            }
        }
        let mut groups: Vec<GroupId> = entry.groups.into_iter().collect();
        groups.sort();
        groups
    }

    /// Snapshot of the sessions currently joined to a group.
    pub async fn broadcast_targets(&self, group_id: &GroupId) -> BTreeSet<SessionId> {
        let room = self.rooms.read().await.get(group_id).cloned();
        match room {
            Some(room) => room.members.lock().await.clone(),
            None => BTreeSet::new(),
        }
    }

    #[cfg(test)]
    pub(crate) async fn groups_of(&self, session_id: &SessionId) -> HashSet<GroupId> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|entry| entry.groups.clone())
            .unwrap_or_default()
    }

    /// Deliver an event to one session. Returns `false` if it is gone or was
    /// dropped because its queue is full.
    pub async fn send_to(&self, session_id: &SessionId, message: ServerMessage) -> bool {
        let outcome = {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                Some(entry) => entry.sender.try_send(message),
                None => return false,
            }
        };
        match outcome {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.drop_slow_session(session_id).await;
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Deliver one event to every session in the group's current snapshot.
    ///
    /// Returns how many sessions accepted it. Sessions whose queue is full
    /// are dropped from the registry, which closes their channel.
    pub async fn fan_out(&self, group_id: &GroupId, message: ServerMessage) -> usize {
        let targets = self.broadcast_targets(group_id).await;
        let mut delivered = 0;
        let mut slow = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for target in &targets {
                let Some(entry) = sessions.get(target) else {
                    continue;
                };
                match entry.sender.try_send(message.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => slow.push(target.clone()),
                    Err(TrySendError::Closed(_)) => {
                        tracing::warn!("Failed to deliver to session '{}' (channel closed)", target);
                    }
                }
            }
        }
        for session_id in &slow {
            self.drop_slow_session(session_id).await;
        }
        delivered
    }

    async fn drop_slow_session(&self, session_id: &SessionId) {
        let groups = self.leave(session_id).await;
        tracing::warn!(
            "Dropped session '{}' (outbound queue full, was in {} group(s))",
            session_id,
            groups.len()
        );
    }

    /// Acquire the group's delivery lock.
    ///
    /// Held across persist and fan-out so broadcast order matches store order.
    pub async fn delivery_lock(&self, group_id: &GroupId) -> OwnedMutexGuard<()> {
        let room = self.room(group_id).await;
        room.delivery.clone().lock_owned().await
    }
}
