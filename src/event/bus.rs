use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use super::events::RoomEvent;

/// Buffered events per room channel before slow subscribers start lagging.
const ROOM_CHANNEL_CAPACITY: usize = 100;

/// Distributes room events to every connection subscribed to that room.
///
/// Channels are created lazily on first emit or subscribe and torn down
/// when the room closes. Rooms are fully independent of each other.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    /// room_id -> sender
    room_channels: Arc<RwLock<HashMap<String, broadcast::Sender<RoomEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            room_channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Emits an event to all subscribers of a specific room.
    pub async fn emit_to_room(&self, room_id: &str, event: RoomEvent) {
        let room_channels = self.room_channels.read().await;

        if let Some(sender) = room_channels.get(room_id) {
            match sender.send(event) {
                Ok(receiver_count) => {
                    debug!(
                        room_id = %room_id,
                        receivers = receiver_count,
                        "Room event emitted"
                    );
                }
                Err(_) => {
                    debug!(room_id = %room_id, "Room event emitted with no receivers");
                }
            }
            return;
        }
        drop(room_channels);

        // First emit for this room: create the channel, then send.
        let mut room_channels = self.room_channels.write().await;
        let sender = room_channels
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .clone();
        if sender.send(event).is_err() {
            debug!(room_id = %room_id, "Room event sent to new channel with no receivers");
        }
    }

    /// Subscribes to events for a specific room.
    pub async fn subscribe_to_room(&self, room_id: &str) -> broadcast::Receiver<RoomEvent> {
        let room_channels = self.room_channels.read().await;

        if let Some(sender) = room_channels.get(room_id) {
            return sender.subscribe();
        }
        drop(room_channels);

        debug!(room_id = %room_id, "Creating room channel for subscription");
        let mut room_channels = self.room_channels.write().await;
        room_channels
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Drops a closed room's channel. Outstanding receivers see the stream
    /// end once the last buffered event is drained.
    pub async fn remove_room(&self, room_id: &str) {
        let mut room_channels = self.room_channels.write().await;
        if room_channels.remove(room_id).is_some() {
            debug!(room_id = %room_id, "Room channel removed");
        }
    }
}
