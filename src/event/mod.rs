// Event-driven communication between the game service and the transport
// layer: actions mutate state, then emit room events that every connected
// subscriber turns into outbound messages.

// Public API - what other modules can use
pub use bus::EventBus;
pub use events::RoomEvent;

// Internal modules
mod bus;
mod events;
