use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::core::{Game, GameError, GameSettings};
use super::placement::Placement;
use super::repository::GameRepository;
use super::scoring::MoveScore;
use super::tiles::RACK_SIZE;
use crate::dictionary::DictionaryOracle;
use crate::shared::AppError;

/// How long a single dictionary lookup may take before the move is
/// rejected. A hung upstream must never block a room.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub connection_id: String,
    pub name: String,
    pub persistent_id: Option<String>,
    /// Honored only when this join creates the room.
    pub board_size: Option<i64>,
    /// Honored only when this join creates the room.
    pub max_rounds: Option<i64>,
    pub join_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JoinResult {
    pub game: Game,
    pub seat: usize,
    pub reconnected: bool,
    /// The identity under which this player is seated; generated when the
    /// client did not present one, and echoed back so it can be stored.
    pub persistent_id: String,
    /// Set only for the creating client.
    pub join_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlayResult {
    pub game: Game,
    pub score: MoveScore,
    pub ended: bool,
}

#[derive(Debug, Clone)]
pub enum LeaveOutcome {
    /// The player left; others remain in the updated game.
    Left(Game),
    /// The last player left and the room was deleted.
    RoomClosed,
    /// The connection was not seated in this room.
    NotSeated,
}

/// The single entry point for everything that mutates a room.
///
/// Every action runs as one atomic step under that room's lock: load the
/// snapshot, validate, (for moves) await dictionary confirmation, mutate,
/// save. The lock is held across the dictionary await, so a second action
/// arriving for the same room cannot interleave; actions on different
/// rooms proceed in parallel.
pub struct GameService {
    repository: Arc<dyn GameRepository>,
    dictionary: Arc<dyn DictionaryOracle>,
    lookup_timeout: Duration,
    room_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl GameService {
    pub fn new(repository: Arc<dyn GameRepository>, dictionary: Arc<dyn DictionaryOracle>) -> Self {
        Self {
            repository,
            dictionary,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            room_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    async fn room_lock(&self, room_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.room_locks.lock().await;
        locks
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Seats or reconnects a player. The first join to a room creates it,
    /// with board size and round limit taken only from that request;
    /// everyone after that must present the room's join code.
    #[instrument(skip(self, request))]
    pub async fn join(&self, room_id: &str, request: JoinRequest) -> Result<JoinResult, AppError> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let (mut game, created) = match self.repository.load(room_id).await? {
            Some(game) => {
                if request.join_code.as_deref() != Some(game.join_code()) {
                    debug!(room_id = %room_id, "Join denied: wrong join code");
                    return Err(AppError::Rejected(GameError::WrongJoinCode));
                }
                if request.board_size.is_some() || request.max_rounds.is_some() {
                    debug!(
                        room_id = %room_id,
                        "Non-creator attempted to set board size or rounds, ignored"
                    );
                }
                (game, false)
            }
            None => {
                let settings = GameSettings::sanitized(request.board_size, request.max_rounds);
                info!(
                    room_id = %room_id,
                    board_size = settings.board_size,
                    max_rounds = settings.max_rounds,
                    "Creating room"
                );
                (Game::new(settings), true)
            }
        };

        let persistent_id = request
            .persistent_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let name = if request.name.trim().is_empty() {
            petname::Petnames::default().generate_one(2, "-")
        } else {
            request.name.clone()
        };

        let outcome = game.join(&request.connection_id, &persistent_id, &name)?;
        self.repository.save(room_id, &game).await?;

        info!(
            room_id = %room_id,
            seat = outcome.seat,
            reconnected = outcome.reconnected,
            "Player joined room"
        );

        Ok(JoinResult {
            seat: outcome.seat,
            reconnected: outcome.reconnected,
            persistent_id,
            join_code: created.then(|| game.join_code().to_string()),
            game,
        })
    }

    /// Validates, dictionary-confirms, scores and commits a placement
    /// batch. Any failure leaves the room exactly as it was.
    #[instrument(skip(self, placements))]
    pub async fn play_tiles(
        &self,
        room_id: &str,
        connection_id: &str,
        placements: &[Placement],
    ) -> Result<PlayResult, AppError> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let mut game = self
            .repository
            .load(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room not found: {}", room_id)))?;

        let staged = game.stage_move(connection_id, placements)?;

        // Confirm every derived word before anything mutates. The room lock
        // is held while these lookups are in flight, so no other action can
        // slip in between validation and commit.
        let mut definitions = HashMap::new();
        for word in &staged.words {
            match tokio::time::timeout(self.lookup_timeout, self.dictionary.lookup(word)).await {
                Ok(Some(defs)) => {
                    definitions.insert(word.clone(), defs);
                }
                Ok(None) => {
                    debug!(room_id = %room_id, word = %word, "Word rejected by dictionary");
                    return Err(AppError::Rejected(GameError::InvalidWord(word.clone())));
                }
                Err(_) => {
                    warn!(room_id = %room_id, word = %word, "Dictionary lookup timed out");
                    return Err(AppError::Rejected(GameError::InvalidWord(word.clone())));
                }
            }
        }

        let score = staged.score;
        game.commit_move(staged, definitions);
        self.repository.save(room_id, &game).await?;

        let ended = game.ended();
        info!(
            room_id = %room_id,
            total = score.total(),
            ended,
            "Move committed"
        );

        Ok(PlayResult { game, score, ended })
    }

    /// Refills the acting player's rack if possible and advances the turn.
    #[instrument(skip(self))]
    pub async fn skip_turn(&self, room_id: &str, connection_id: &str) -> Result<Game, AppError> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let mut game = self
            .repository
            .load(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room not found: {}", room_id)))?;

        game.skip_turn(connection_id)?;
        self.repository.save(room_id, &game).await?;

        info!(room_id = %room_id, "Turn skipped");
        Ok(game)
    }

    /// Applies a rack reordering. Returns the updated game when accepted;
    /// None when the proposal was silently ignored (not a permutation, or
    /// not that player's turn), in which case nothing is saved or
    /// broadcast.
    #[instrument(skip(self, rack))]
    pub async fn reorder_rack(
        &self,
        room_id: &str,
        connection_id: &str,
        rack: [Option<char>; RACK_SIZE],
    ) -> Result<Option<Game>, AppError> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let Some(mut game) = self.repository.load(room_id).await? else {
            return Ok(None);
        };

        if !game.reorder_rack(connection_id, rack) {
            debug!(room_id = %room_id, "Rack reorder ignored");
            return Ok(None);
        }

        self.repository.save(room_id, &game).await?;
        Ok(Some(game))
    }

    /// Removes a disconnected player; deletes the room when it empties.
    #[instrument(skip(self))]
    pub async fn leave(&self, room_id: &str, connection_id: &str) -> Result<LeaveOutcome, AppError> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let Some(mut game) = self.repository.load(room_id).await? else {
            return Ok(LeaveOutcome::NotSeated);
        };

        if !game.remove_connection(connection_id) {
            return Ok(LeaveOutcome::NotSeated);
        }

        if game.is_empty() {
            self.repository.remove(room_id).await?;
            self.room_locks.lock().await.remove(room_id);
            info!(room_id = %room_id, "Last player left, room closed");
            return Ok(LeaveOutcome::RoomClosed);
        }

        self.repository.save(room_id, &game).await?;
        info!(room_id = %room_id, remaining = game.players().len(), "Player left room");
        Ok(LeaveOutcome::Left(game))
    }

    /// Read-only access to a room's current state.
    pub async fn get_game(&self, room_id: &str) -> Result<Option<Game>, AppError> {
        self.repository.load(room_id).await
    }
}
