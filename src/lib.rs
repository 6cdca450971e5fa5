// Library crate for the squword game server
// This file exposes the public API for integration tests

pub mod dictionary;
pub mod event;
pub mod game;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use event::{EventBus, RoomEvent};
pub use game::{Game, GameError, GameService, GameSettings};
pub use shared::AppError;
pub use websockets::{
    ConnectionManager, GameMessageHandler, GameView, MessageHandler, MessageType, WebSocketMessage,
};
