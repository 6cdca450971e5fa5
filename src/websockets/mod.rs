// Public API
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use handler::{websocket_handler, GameMessageHandler};
pub use messages::{GameView, MessageType, PlayerView, WebSocketMessage};
pub use socket::MessageHandler;

// Internal modules
mod connection_manager;
mod handler;
pub mod messages;
mod socket;
