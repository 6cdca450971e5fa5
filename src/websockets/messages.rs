use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::game::{Game, MoveScore, Placement, RACK_SIZE};

/// Message types for WebSocket communication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    // Client -> Server
    Join,
    PlayTiles,
    SkipTurn,
    ReorderRack,

    // Server -> Client
    JoinOk,
    JoinDenied,
    MoveResult,
    GameUpdate,
    Error,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Base structure for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
    pub meta: Option<WebSocketMessageMeta>,
}

/// Client-to-Server message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinPayload {
    pub name: String,
    #[serde(default)]
    pub persistent_id: Option<String>,
    #[serde(default)]
    pub board_size: Option<i64>,
    #[serde(default)]
    pub rounds: Option<i64>,
    #[serde(default)]
    pub join_code: Option<String>,
}

/// One proposed tile as it arrives on the wire. Strictly typed: the
/// coordinates must be JSON integers and the letter a one-character
/// string; anything else fails before reaching the validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementPayload {
    pub row: i64,
    pub col: i64,
    pub letter: String,
    pub rack_slot: usize,
}

impl PlacementPayload {
    /// Normalizes into a domain placement: exactly one ASCII letter,
    /// uppercased.
    pub fn to_placement(&self) -> Result<Placement, String> {
        let mut chars = self.letter.chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
            _ => return Err(format!("Invalid letter: '{}'", self.letter)),
        };
        Ok(Placement {
            row: self.row,
            col: self.col,
            letter,
            rack_slot: self.rack_slot,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayTilesPayload {
    pub placements: Vec<PlacementPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRackPayload {
    pub rack: Vec<Option<String>>,
}

impl ReorderRackPayload {
    /// Normalizes into a full 7-slot rack of uppercase letters and empties.
    pub fn to_rack(&self) -> Result<[Option<char>; RACK_SIZE], String> {
        if self.rack.len() != RACK_SIZE {
            return Err(format!("Rack must have exactly {} slots", RACK_SIZE));
        }
        let mut slots = [None; RACK_SIZE];
        for (i, entry) in self.rack.iter().enumerate() {
            if let Some(letter) = entry {
                let mut chars = letter.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphabetic() => {
                        slots[i] = Some(c.to_ascii_uppercase());
                    }
                    _ => return Err(format!("Invalid letter: '{}'", letter)),
                }
            }
        }
        Ok(slots)
    }
}

/// Server-to-Client message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinOkPayload {
    pub seat: usize,
    pub reconnected: bool,
    /// Identity the seat is bound to; clients store it to reconnect.
    pub persistent_id: String,
    /// Present only for the creating client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinDeniedPayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResultPayload {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// One player's slice of the broadcast view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    /// Always exactly 7 entries; fully empty for redacted opponents.
    pub rack: Vec<Option<char>>,
    pub score: u32,
}

/// The full session view broadcast after every accepted state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    pub board: Vec<Vec<Option<char>>>,
    pub turn_index: usize,
    pub players: Vec<PlayerView>,
    pub join_code: String,
    pub last_definitions: HashMap<String, Vec<String>>,
    pub current_round: u32,
    pub max_rounds: u32,
    pub final_phase: bool,
    pub final_remaining: usize,
    pub running: bool,
    pub ended: bool,
    /// Display names of the winning players once ended.
    pub winners: Vec<String>,
    pub tiles_remaining: usize,
}

impl GameView {
    /// The authoritative view with every rack visible. Prefer
    /// [`GameView::for_connection`] for anything sent to a client.
    pub fn full(game: &Game) -> Self {
        Self {
            board: game.board().rows(),
            turn_index: game.turn_index(),
            players: game
                .players()
                .iter()
                .map(|p| PlayerView {
                    name: p.name.clone(),
                    rack: p.rack.slots().to_vec(),
                    score: p.score,
                })
                .collect(),
            join_code: game.join_code().to_string(),
            last_definitions: game.last_definitions().clone(),
            current_round: game.current_round(),
            max_rounds: game.max_rounds(),
            final_phase: game.final_phase(),
            final_remaining: game.final_remaining(),
            running: game.running(),
            ended: game.ended(),
            winners: game
                .winners()
                .iter()
                .filter_map(|&seat| game.players().get(seat).map(|p| p.name.clone()))
                .collect(),
            tiles_remaining: game.tile_bag_len(),
        }
    }

    /// The view for one connection: only that player's own rack letters
    /// are visible, every other rack is opaque.
    pub fn for_connection(game: &Game, connection_id: &str) -> Self {
        let own_seat = game.seat_of_connection(connection_id);
        let mut view = Self::full(game);
        for (seat, player) in view.players.iter_mut().enumerate() {
            if Some(seat) != own_seat {
                player.rack = vec![None; RACK_SIZE];
            }
        }
        view
    }
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
            }),
        }
    }

    /// Create a JOIN_OK message
    pub fn join_ok(
        seat: usize,
        reconnected: bool,
        persistent_id: String,
        join_code: Option<String>,
    ) -> Self {
        let payload = JoinOkPayload {
            seat,
            reconnected,
            persistent_id,
            join_code,
        };
        Self::new(MessageType::JoinOk, serde_json::to_value(payload).unwrap())
    }

    /// Create a JOIN_DENIED message
    pub fn join_denied(message: String) -> Self {
        let payload = JoinDeniedPayload { message };
        Self::new(
            MessageType::JoinDenied,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a successful MOVE_RESULT message with the score breakdown
    pub fn move_accepted(score: MoveScore) -> Self {
        let payload = MoveResultPayload {
            ok: true,
            message: None,
            main_score: Some(score.main),
            cross_score: Some(score.cross),
            total: Some(score.total()),
        };
        Self::new(
            MessageType::MoveResult,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a rejection MOVE_RESULT message
    pub fn move_rejected(message: String) -> Self {
        let payload = MoveResultPayload {
            ok: false,
            message: Some(message),
            main_score: None,
            cross_score: None,
            total: None,
        };
        Self::new(
            MessageType::MoveResult,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a GAME_UPDATE message
    pub fn game_update(view: GameView) -> Self {
        Self::new(MessageType::GameUpdate, serde_json::to_value(view).unwrap())
    }

    /// Create an ERROR message
    pub fn error(message: String) -> Self {
        let payload = ErrorPayload { message };
        Self::new(MessageType::Error, serde_json::to_value(payload).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameSettings;

    #[test]
    fn test_message_type_wire_tags() {
        let msg = WebSocketMessage::new(MessageType::PlayTiles, serde_json::json!({}));
        let encoded = serde_json::to_string(&msg).unwrap();
        assert!(encoded.contains("\"PLAY_TILES\""));

        let back: WebSocketMessage = serde_json::from_str(&encoded).unwrap();
        assert_eq!(back.message_type, MessageType::PlayTiles);
    }

    #[test]
    fn test_placement_payload_normalization() {
        let payload = PlacementPayload {
            row: 7,
            col: 8,
            letter: "t".to_string(),
            rack_slot: 3,
        };
        let placement = payload.to_placement().unwrap();
        assert_eq!(placement.letter, 'T');
        assert_eq!(placement.row, 7);
        assert_eq!(placement.rack_slot, 3);

        for bad in ["", "AB", "1", "é"] {
            let payload = PlacementPayload {
                row: 0,
                col: 0,
                letter: bad.to_string(),
                rack_slot: 0,
            };
            assert!(payload.to_placement().is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_reorder_payload_normalization() {
        let payload = ReorderRackPayload {
            rack: vec![
                Some("a".to_string()),
                None,
                Some("B".to_string()),
                None,
                None,
                None,
                None,
            ],
        };
        let slots = payload.to_rack().unwrap();
        assert_eq!(slots[0], Some('A'));
        assert_eq!(slots[1], None);
        assert_eq!(slots[2], Some('B'));

        let short = ReorderRackPayload { rack: vec![None; 3] };
        assert!(short.to_rack().is_err());

        let bad = ReorderRackPayload {
            rack: vec![Some("ZZ".to_string()), None, None, None, None, None, None],
        };
        assert!(bad.to_rack().is_err());
    }

    #[test]
    fn test_view_redacts_other_racks() {
        let mut game = Game::new(GameSettings::default());
        game.join("conn-0", "id-0", "Alice").unwrap();
        game.join("conn-1", "id-1", "Bob").unwrap();

        let view = GameView::for_connection(&game, "conn-0");
        assert!(view.players[0].rack.iter().all(|slot| slot.is_some()));
        assert!(view.players[1].rack.iter().all(|slot| slot.is_none()));
        assert_eq!(view.players[1].rack.len(), RACK_SIZE);

        // A spectator connection sees no rack at all.
        let view = GameView::for_connection(&game, "conn-watcher");
        assert!(view
            .players
            .iter()
            .all(|p| p.rack.iter().all(|s| s.is_none())));

        // The authoritative view keeps everything.
        let view = GameView::full(&game);
        assert!(view
            .players
            .iter()
            .all(|p| p.rack.iter().all(|s| s.is_some())));
    }

    #[test]
    fn test_join_ok_omits_absent_join_code() {
        let msg = WebSocketMessage::join_ok(1, false, "pid".to_string(), None);
        let encoded = serde_json::to_string(&msg).unwrap();
        assert!(!encoded.contains("join_code"));

        let msg = WebSocketMessage::join_ok(0, false, "pid".to_string(), Some("CODE".into()));
        let encoded = serde_json::to_string(&msg).unwrap();
        assert!(encoded.contains("\"join_code\":\"CODE\""));
    }

    #[test]
    fn test_move_result_constructors() {
        let accepted = WebSocketMessage::move_accepted(MoveScore { main: 10, cross: 3 });
        assert_eq!(accepted.message_type, MessageType::MoveResult);
        let payload: MoveResultPayload = serde_json::from_value(accepted.payload).unwrap();
        assert!(payload.ok);
        assert_eq!(payload.total, Some(13));

        let rejected = WebSocketMessage::move_rejected("not your turn".to_string());
        let payload: MoveResultPayload = serde_json::from_value(rejected.payload).unwrap();
        assert!(!payload.ok);
        assert_eq!(payload.message.as_deref(), Some("not your turn"));
    }
}
