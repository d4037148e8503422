// src/engine/broadcaster.rs

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::models::{leaderboard::PlayerId, realtime::ServerMessage};

pub type ConnectionId = Uuid;

/// Per-subscriber outbound channel. Bounded so a stalled client cannot grow memory.
pub type SubscriberSender = mpsc::Sender<ServerMessage>;

/// Lifecycle of a realtime connection. A disconnected connection is simply absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    JoinedRoom(String),
}

struct Subscriber {
    player_id: PlayerId,
    sender: SubscriberSender,
    state: ConnectionState,
}

/// Tracks realtime connections and their room membership, and fans messages out.
///
/// Delivery is fire-and-forget: a full buffer drops the message for that
/// subscriber only, and a closed channel unregisters it.
#[derive(Default)]
pub struct Broadcaster {
    subscribers: RwLock<HashMap<ConnectionId, Subscriber>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connect(&self, connection_id: ConnectionId, player_id: &str, sender: SubscriberSender) {
        self.subscribers.write().await.insert(
            connection_id,
            Subscriber {
                player_id: player_id.to_string(),
                sender,
                state: ConnectionState::Connected,
            },
        );
        tracing::debug!(%connection_id, player_id, "Realtime client connected");
    }

    /// Moves the connection into `room_id`, leaving any previous room.
    /// Returns false when the connection is unknown.
    pub async fn join_room(&self, connection_id: ConnectionId, room_id: &str) -> bool {
        let mut subscribers = self.subscribers.write().await;
        let Some(subscriber) = subscribers.get_mut(&connection_id) else {
            return false;
        };
        subscriber.state = ConnectionState::JoinedRoom(room_id.to_string());
        tracing::debug!(%connection_id, room_id, "Joined room");
        true
    }

    pub async fn leave_room(&self, connection_id: ConnectionId) {
        if let Some(subscriber) = self.subscribers.write().await.get_mut(&connection_id) {
            subscriber.state = ConnectionState::Connected;
        }
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) {
        if self
            .subscribers
            .write()
            .await
            .remove(&connection_id)
            .is_some()
        {
            tracing::debug!(%connection_id, "Realtime client disconnected");
        }
    }

    pub async fn state(&self, connection_id: ConnectionId) -> Option<ConnectionState> {
        self.subscribers
            .read()
            .await
            .get(&connection_id)
            .map(|subscriber| subscriber.state.clone())
    }

    pub async fn player_of(&self, connection_id: ConnectionId) -> Option<PlayerId> {
        self.subscribers
            .read()
            .await
            .get(&connection_id)
            .map(|subscriber| subscriber.player_id.clone())
    }

    pub async fn room_size(&self, room_id: &str) -> usize {
        self.subscribers
            .read()
            .await
            .values()
            .filter(|subscriber| in_room(subscriber, room_id))
            .count()
    }

    /// Pushes to a single connection. Returns whether the message was queued.
    pub async fn send_to(&self, connection_id: ConnectionId, message: ServerMessage) -> bool {
        let delivered = {
            let subscribers = self.subscribers.read().await;
            match subscribers.get(&connection_id) {
                Some(subscriber) => deliver(connection_id, subscriber, message),
                None => return false,
            }
        };
        if delivered == Delivery::Closed {
            self.disconnect(connection_id).await;
        }
        delivered == Delivery::Queued
    }

    /// Pushes to every connection currently in `room_id`. Returns how many were queued.
    pub async fn broadcast(&self, room_id: &str, message: &ServerMessage) -> usize {
        let mut queued = 0;
        let mut closed = Vec::new();
        {
            let subscribers = self.subscribers.read().await;
            for (connection_id, subscriber) in subscribers.iter() {
                if !in_room(subscriber, room_id) {
                    continue;
                }
                match deliver(*connection_id, subscriber, message.clone()) {
                    Delivery::Queued => queued += 1,
                    Delivery::Dropped => {}
                    Delivery::Closed => closed.push(*connection_id),
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for connection_id in closed {
                subscribers.remove(&connection_id);
            }
        }

        tracing::debug!(room_id, queued, "Broadcast complete");
        queued
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Delivery {
    Queued,
    Dropped,
    Closed,
}

fn in_room(subscriber: &Subscriber, room_id: &str) -> bool {
    matches!(&subscriber.state, ConnectionState::JoinedRoom(room) if room == room_id)
}

fn deliver(connection_id: ConnectionId, subscriber: &Subscriber, message: ServerMessage) -> Delivery {
    match subscriber.sender.try_send(message) {
        Ok(()) => Delivery::Queued,
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::warn!(%connection_id, "Subscriber buffer full, dropping message");
            Delivery::Dropped
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
    }
}
