use async_trait::async_trait;
use axum::{
    extract::ws::WebSocket,
    extract::{Path, State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::event::RoomEvent;
use crate::game::service::JoinRequest;
use crate::game::LeaveOutcome;
use crate::shared::{AppError, AppState};

use super::messages::{
    GameView, JoinPayload, MessageType, PlayTilesPayload, ReorderRackPayload, WebSocketMessage,
};
use super::socket::{Connection, MessageHandler};

/// Upgrades GET /ws/{room_id} and runs the connection to completion.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, room_id, state))
}

async fn handle_socket(socket: WebSocket, room_id: String, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    info!(connection_id = %connection_id, room_id = %room_id, "WebSocket connected");

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    state
        .connections
        .add_connection(connection_id.clone(), outbound_tx)
        .await;

    // Every broadcast for the room is re-derived per connection so that
    // only this player's own rack letters go out on this socket.
    let forwarder = tokio::spawn(forward_room_events(
        state.clone(),
        room_id.clone(),
        connection_id.clone(),
    ));

    let handler = Arc::new(GameMessageHandler::new(state.clone()));
    let connection = Connection::new(
        connection_id.clone(),
        room_id.clone(),
        Box::new(socket),
        outbound_rx,
        handler,
    );
    if let Err(e) = connection.run().await {
        warn!(connection_id = %connection_id, error = ?e, "Connection ended with error");
    }

    forwarder.abort();
    state.connections.remove_connection(&connection_id).await;

    // Free the seat and let the rest of the room know.
    match state.game_service.leave(&room_id, &connection_id).await {
        Ok(LeaveOutcome::Left(game)) => {
            state
                .event_bus
                .emit_to_room(&room_id, RoomEvent::GameUpdated { game })
                .await;
        }
        Ok(LeaveOutcome::RoomClosed) => {
            state
                .event_bus
                .emit_to_room(&room_id, RoomEvent::RoomClosed)
                .await;
            state.event_bus.remove_room(&room_id).await;
        }
        Ok(LeaveOutcome::NotSeated) => {}
        Err(e) => warn!(room_id = %room_id, error = %e, "Disconnect cleanup failed"),
    }

    info!(connection_id = %connection_id, room_id = %room_id, "WebSocket disconnected");
}

/// Turns room events into outbound messages for one connection.
async fn forward_room_events(state: AppState, room_id: String, connection_id: String) {
    let mut events = state.event_bus.subscribe_to_room(&room_id).await;
    loop {
        match events.recv().await {
            Ok(RoomEvent::GameUpdated { game }) => {
                let view = GameView::for_connection(&game, &connection_id);
                send(&state, &connection_id, WebSocketMessage::game_update(view)).await;
            }
            Ok(RoomEvent::RoomClosed) => break,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(
                    connection_id = %connection_id,
                    skipped,
                    "Subscriber lagged behind room broadcasts"
                );
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn send(state: &AppState, connection_id: &str, message: WebSocketMessage) {
    match serde_json::to_string(&message) {
        Ok(encoded) => {
            state
                .connections
                .send_to_connection(connection_id, &encoded)
                .await;
        }
        Err(e) => warn!(error = %e, "Failed to encode outbound message"),
    }
}

/// Translates inbound client messages into game service calls.
///
/// Rejections go back to the submitting connection only; accepted actions
/// additionally emit the updated state to the whole room.
pub struct GameMessageHandler {
    state: AppState,
}

impl GameMessageHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn handle_join(&self, connection_id: &str, room_id: &str, payload: JoinPayload) {
        let request = JoinRequest {
            connection_id: connection_id.to_string(),
            name: payload.name,
            persistent_id: payload.persistent_id,
            board_size: payload.board_size,
            max_rounds: payload.rounds,
            join_code: payload.join_code,
        };

        match self.state.game_service.join(room_id, request).await {
            Ok(result) => {
                send(
                    &self.state,
                    connection_id,
                    WebSocketMessage::join_ok(
                        result.seat,
                        result.reconnected,
                        result.persistent_id,
                        result.join_code,
                    ),
                )
                .await;
                self.state
                    .event_bus
                    .emit_to_room(room_id, RoomEvent::GameUpdated { game: result.game })
                    .await;
            }
            Err(AppError::Rejected(err)) => {
                send(
                    &self.state,
                    connection_id,
                    WebSocketMessage::join_denied(err.to_string()),
                )
                .await;
            }
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Join failed");
                send(
                    &self.state,
                    connection_id,
                    WebSocketMessage::error("Join failed, try again".to_string()),
                )
                .await;
            }
        }
    }

    async fn handle_play_tiles(
        &self,
        connection_id: &str,
        room_id: &str,
        payload: PlayTilesPayload,
    ) {
        let placements: Result<Vec<_>, _> = payload
            .placements
            .iter()
            .map(|p| p.to_placement())
            .collect();
        let placements = match placements {
            Ok(placements) => placements,
            Err(message) => {
                send(
                    &self.state,
                    connection_id,
                    WebSocketMessage::move_rejected(message),
                )
                .await;
                return;
            }
        };

        match self
            .state
            .game_service
            .play_tiles(room_id, connection_id, &placements)
            .await
        {
            Ok(result) => {
                send(
                    &self.state,
                    connection_id,
                    WebSocketMessage::move_accepted(result.score),
                )
                .await;
                self.state
                    .event_bus
                    .emit_to_room(room_id, RoomEvent::GameUpdated { game: result.game })
                    .await;
            }
            Err(AppError::Rejected(err)) => {
                send(
                    &self.state,
                    connection_id,
                    WebSocketMessage::move_rejected(err.to_string()),
                )
                .await;
            }
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Move failed");
                send(
                    &self.state,
                    connection_id,
                    WebSocketMessage::error("Move failed, try again".to_string()),
                )
                .await;
            }
        }
    }

    async fn handle_skip_turn(&self, connection_id: &str, room_id: &str) {
        match self.state.game_service.skip_turn(room_id, connection_id).await {
            Ok(game) => {
                self.state
                    .event_bus
                    .emit_to_room(room_id, RoomEvent::GameUpdated { game })
                    .await;
            }
            Err(AppError::Rejected(err)) => {
                send(
                    &self.state,
                    connection_id,
                    WebSocketMessage::move_rejected(err.to_string()),
                )
                .await;
            }
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Skip failed");
            }
        }
    }

    async fn handle_reorder_rack(
        &self,
        connection_id: &str,
        room_id: &str,
        payload: ReorderRackPayload,
    ) {
        // Invalid reorders are dropped without a reply so a probing client
        // learns nothing about the server-side rack.
        let rack = match payload.to_rack() {
            Ok(rack) => rack,
            Err(message) => {
                debug!(connection_id = %connection_id, message, "Malformed rack reorder ignored");
                return;
            }
        };

        match self
            .state
            .game_service
            .reorder_rack(room_id, connection_id, rack)
            .await
        {
            Ok(Some(game)) => {
                self.state
                    .event_bus
                    .emit_to_room(room_id, RoomEvent::GameUpdated { game })
                    .await;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Rack reorder failed");
            }
        }
    }
}

#[async_trait]
impl MessageHandler for GameMessageHandler {
    async fn handle_message(&self, connection_id: &str, room_id: &str, message: String) {
        debug!(
            connection_id = %connection_id,
            room_id = %room_id,
            "Received message"
        );

        let ws_message = match serde_json::from_str::<WebSocketMessage>(&message) {
            Ok(ws_message) => ws_message,
            Err(e) => {
                debug!(connection_id = %connection_id, error = %e, "Malformed message");
                send(
                    &self.state,
                    connection_id,
                    WebSocketMessage::error("Malformed message".to_string()),
                )
                .await;
                return;
            }
        };

        match ws_message.message_type {
            MessageType::Join => {
                match serde_json::from_value::<JoinPayload>(ws_message.payload) {
                    Ok(payload) => self.handle_join(connection_id, room_id, payload).await,
                    Err(e) => {
                        debug!(error = %e, "Invalid JOIN payload");
                        send(
                            &self.state,
                            connection_id,
                            WebSocketMessage::error("Invalid JOIN payload".to_string()),
                        )
                        .await;
                    }
                }
            }
            MessageType::PlayTiles => {
                match serde_json::from_value::<PlayTilesPayload>(ws_message.payload) {
                    Ok(payload) => {
                        self.handle_play_tiles(connection_id, room_id, payload).await
                    }
                    Err(e) => {
                        debug!(error = %e, "Invalid PLAY_TILES payload");
                        send(
                            &self.state,
                            connection_id,
                            WebSocketMessage::move_rejected(
                                "Invalid placement payload".to_string(),
                            ),
                        )
                        .await;
                    }
                }
            }
            MessageType::SkipTurn => {
                self.handle_skip_turn(connection_id, room_id).await;
            }
            MessageType::ReorderRack => {
                match serde_json::from_value::<ReorderRackPayload>(ws_message.payload) {
                    Ok(payload) => {
                        self.handle_reorder_rack(connection_id, room_id, payload).await
                    }
                    Err(e) => {
                        debug!(error = %e, "Invalid REORDER_RACK payload ignored");
                    }
                }
            }
            _ => {
                debug!(
                    message_type = ?ws_message.message_type,
                    "Unhandled message type"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use crate::websockets::messages::{JoinOkPayload, MoveResultPayload};

    /// Registers a connection and returns the channel its replies land on.
    async fn connect(state: &AppState, connection_id: &str) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        state
            .connections
            .add_connection(connection_id.to_string(), tx)
            .await;
        rx
    }

    fn join_message(name: &str, join_code: Option<&str>) -> String {
        serde_json::to_string(&WebSocketMessage::new(
            MessageType::Join,
            serde_json::json!({
                "name": name,
                "join_code": join_code,
            }),
        ))
        .unwrap()
    }

    async fn next_message(rx: &mut mpsc::UnboundedReceiver<String>) -> WebSocketMessage {
        let raw = rx.recv().await.expect("expected an outbound message");
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_join_replies_and_broadcasts() {
        let state = AppStateBuilder::new().build();
        let handler = GameMessageHandler::new(state.clone());
        let mut rx = connect(&state, "conn-0").await;
        let mut events = state.event_bus.subscribe_to_room("room-1").await;

        handler
            .handle_message("conn-0", "room-1", join_message("Alice", None))
            .await;

        let reply = next_message(&mut rx).await;
        assert_eq!(reply.message_type, MessageType::JoinOk);
        let payload: JoinOkPayload = serde_json::from_value(reply.payload).unwrap();
        assert_eq!(payload.seat, 0);
        assert!(payload.join_code.is_some());

        let event = events.recv().await.unwrap();
        assert!(matches!(event, RoomEvent::GameUpdated { .. }));
    }

    #[tokio::test]
    async fn test_join_with_wrong_code_is_denied() {
        let state = AppStateBuilder::new().build();
        let handler = GameMessageHandler::new(state.clone());
        let mut rx0 = connect(&state, "conn-0").await;
        let mut rx1 = connect(&state, "conn-1").await;

        handler
            .handle_message("conn-0", "room-1", join_message("Alice", None))
            .await;
        let _ = next_message(&mut rx0).await;

        handler
            .handle_message("conn-1", "room-1", join_message("Bob", Some("WRONG")))
            .await;

        let reply = next_message(&mut rx1).await;
        assert_eq!(reply.message_type, MessageType::JoinDenied);
    }

    #[tokio::test]
    async fn test_rejected_move_goes_to_submitter_only() {
        let state = AppStateBuilder::new().build();
        let handler = GameMessageHandler::new(state.clone());
        let mut rx = connect(&state, "conn-0").await;
        let mut events = state.event_bus.subscribe_to_room("room-1").await;

        handler
            .handle_message("conn-0", "room-1", join_message("Alice", None))
            .await;
        let _ = next_message(&mut rx).await;
        // Drain the join broadcast.
        let _ = events.recv().await.unwrap();

        // One player: the game is not running yet, so any move is rejected.
        let play = serde_json::to_string(&WebSocketMessage::new(
            MessageType::PlayTiles,
            serde_json::json!({
                "placements": [{"row": 7, "col": 7, "letter": "A", "rack_slot": 0}],
            }),
        ))
        .unwrap();
        handler.handle_message("conn-0", "room-1", play).await;

        let reply = next_message(&mut rx).await;
        assert_eq!(reply.message_type, MessageType::MoveResult);
        let payload: MoveResultPayload = serde_json::from_value(reply.payload).unwrap();
        assert!(!payload.ok);

        // No broadcast was produced by the rejection.
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_malformed_message_gets_error_reply() {
        let state = AppStateBuilder::new().build();
        let handler = GameMessageHandler::new(state.clone());
        let mut rx = connect(&state, "conn-0").await;

        handler
            .handle_message("conn-0", "room-1", "not json at all".to_string())
            .await;

        let reply = next_message(&mut rx).await;
        assert_eq!(reply.message_type, MessageType::Error);
    }
}
