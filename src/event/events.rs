use serde::{Deserialize, Serialize};

use crate::game::Game;

/// Events distributed to a room's subscribers.
///
/// Events represent facts about state changes that have already been
/// validated, applied and persisted. A rejected action never produces one:
/// rejections go back to the submitter alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoomEvent {
    /// The room's authoritative state changed. Carries the full snapshot;
    /// each subscriber derives the view appropriate for its own player
    /// (racks of other players are redacted at the connection).
    GameUpdated { game: Game },

    /// The last player disconnected and the room was deleted.
    RoomClosed,
}

impl RoomEvent {
    /// Human-readable tag, used in logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            RoomEvent::GameUpdated { .. } => "game_updated",
            RoomEvent::RoomClosed => "room_closed",
        }
    }
}
