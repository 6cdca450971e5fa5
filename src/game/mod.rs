// Public API
pub use board::{Board, Bonus, BonusLayout};
pub use core::{Game, GameError, GameSettings, JoinOutcome, Player, StagedMove, MAX_PLAYERS};
pub use placement::{CheckedPlacement, Placement, PlacementError};
pub use scoring::MoveScore;
pub use service::{GameService, JoinRequest, JoinResult, LeaveOutcome, PlayResult};
pub use tiles::{letter_points, Rack, TileBag, RACK_SIZE};
pub use words::{Axis, CrossWord, WordTile};

// Internal modules
mod board;
mod core;
mod placement;
pub mod repository;
mod scoring;
pub mod service;
mod tiles;
mod words;
