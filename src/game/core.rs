use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::board::{Board, BonusLayout, DEFAULT_BOARD_SIZE, MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use super::placement::{self, CheckedPlacement, Placement, PlacementError};
use super::scoring::{self, MoveScore};
use super::tiles::{Rack, TileBag, RACK_SIZE};
use super::words;

/// Seats per room.
pub const MAX_PLAYERS: usize = 4;
pub const DEFAULT_MAX_ROUNDS: u32 = 12;
pub const MAX_ROUNDS_LIMIT: u32 = 1000;

const JOIN_CODE_LEN: usize = 8;
// Ambiguous characters (0/O, 1/I/L) left out.
const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("game is not running")]
    NotRunning,
    #[error("not your turn")]
    NotYourTurn,
    #[error("{0}")]
    Placement(#[from] PlacementError),
    #[error("rack slot {slot} does not hold '{letter}'")]
    TileNotInRack { slot: usize, letter: char },
    #[error("'{0}' is not a valid word")]
    InvalidWord(String),
    #[error("room is full")]
    RoomFull,
    #[error("invalid join code")]
    WrongJoinCode,
    #[error("player is not seated in this room")]
    NotSeated,
}

/// Room parameters, settable only by the creating client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    pub board_size: usize,
    pub max_rounds: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

impl GameSettings {
    /// Builds settings from raw client input, clamping into the supported
    /// ranges and falling back to the defaults when absent.
    pub fn sanitized(board_size: Option<i64>, max_rounds: Option<i64>) -> Self {
        let defaults = Self::default();
        Self {
            board_size: board_size
                .map(|n| n.clamp(MIN_BOARD_SIZE as i64, MAX_BOARD_SIZE as i64) as usize)
                .unwrap_or(defaults.board_size),
            max_rounds: max_rounds
                .map(|n| n.clamp(1, MAX_ROUNDS_LIMIT as i64) as u32)
                .unwrap_or(defaults.max_rounds),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Transport handle; replaced when the same identity rejoins.
    pub connection_id: String,
    /// Client-held identifier that survives reconnection.
    pub persistent_id: String,
    pub name: String,
    pub rack: Rack,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    pub seat: usize,
    pub reconnected: bool,
}

/// A validated, scored move waiting on dictionary confirmation.
///
/// Produced by [`Game::stage_move`] without mutating anything; committed by
/// [`Game::commit_move`] once every word has been confirmed.
#[derive(Debug, Clone)]
pub struct StagedMove {
    pub seat: usize,
    pub placements: Vec<CheckedPlacement>,
    /// The words (length >= 2) that must pass dictionary confirmation.
    pub words: Vec<String>,
    pub score: MoveScore,
}

/// One room's authoritative state: board, racks, bag, scores and the
/// turn/round/endgame machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    board: Board,
    bonus_layout: BonusLayout,
    players: Vec<Player>,
    turn_index: usize,
    tile_bag: TileBag,
    running: bool,
    current_round: u32,
    max_rounds: u32,
    round_start_index: usize,
    final_phase: bool,
    final_starter: usize,
    final_remaining: usize,
    ended: bool,
    /// Seat indices tied for the highest score once ended.
    winners: Vec<usize>,
    join_code: String,
    /// word -> definitions from the most recent confirmed move.
    last_definitions: HashMap<String, Vec<String>>,
}

impl Game {
    pub fn new(settings: GameSettings) -> Self {
        Self {
            board: Board::new(settings.board_size),
            bonus_layout: BonusLayout::standard(settings.board_size),
            players: Vec::new(),
            turn_index: 0,
            tile_bag: TileBag::standard(),
            running: false,
            current_round: 0,
            max_rounds: settings.max_rounds,
            round_start_index: 0,
            final_phase: false,
            final_starter: 0,
            final_remaining: 0,
            ended: false,
            winners: Vec::new(),
            join_code: generate_join_code(),
            last_definitions: HashMap::new(),
        }
    }

    /// Builds a session from explicit parts: seated players, turn pointer
    /// and a custom tile bag. Used to reconstruct known positions in tests
    /// and tooling; regular rooms grow through [`Game::join`].
    pub fn with_state(
        settings: GameSettings,
        players: Vec<Player>,
        turn_index: usize,
        tile_bag: TileBag,
    ) -> Self {
        let running = players.len() >= 2;
        Self {
            players,
            turn_index,
            tile_bag,
            running,
            round_start_index: turn_index,
            ..Self::new(settings)
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn final_phase(&self) -> bool {
        self.final_phase
    }

    pub fn final_remaining(&self) -> usize {
        self.final_remaining
    }

    pub fn winners(&self) -> &[usize] {
        &self.winners
    }

    pub fn join_code(&self) -> &str {
        &self.join_code
    }

    pub fn tile_bag_len(&self) -> usize {
        self.tile_bag.len()
    }

    pub fn last_definitions(&self) -> &HashMap<String, Vec<String>> {
        &self.last_definitions
    }

    pub fn seat_of_connection(&self, connection_id: &str) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.connection_id == connection_id)
    }

    pub fn seat_of_identity(&self, persistent_id: &str) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.persistent_id == persistent_id)
    }

    /// Seats a new player, or re-binds the connection of a returning one.
    ///
    /// A join whose persistent identity matches an existing seat is a
    /// reconnection and never consumes a new seat; otherwise the room must
    /// have a seat free. Becoming the second player starts the game.
    pub fn join(
        &mut self,
        connection_id: &str,
        persistent_id: &str,
        name: &str,
    ) -> Result<JoinOutcome, GameError> {
        if let Some(seat) = self.seat_of_identity(persistent_id) {
            let Game { players, tile_bag, .. } = self;
            let player = &mut players[seat];
            player.connection_id = connection_id.to_string();
            player.rack.refill_from(tile_bag);
            return Ok(JoinOutcome {
                seat,
                reconnected: true,
            });
        }

        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::RoomFull);
        }

        let mut rack = Rack::empty();
        rack.refill_from(&mut self.tile_bag);
        let seat = self.players.len();
        self.players.push(Player {
            connection_id: connection_id.to_string(),
            persistent_id: persistent_id.to_string(),
            name: name.to_string(),
            rack,
            score: 0,
        });

        if !self.ended && self.players.len() >= 2 && !self.running {
            self.running = true;
            self.round_start_index = self.turn_index;
        }

        Ok(JoinOutcome {
            seat,
            reconnected: false,
        })
    }

    /// Validates and scores a placement batch without mutating anything.
    ///
    /// The returned staged move carries the words that still need
    /// dictionary confirmation; commit only after every one is confirmed.
    pub fn stage_move(
        &self,
        connection_id: &str,
        placements: &[Placement],
    ) -> Result<StagedMove, GameError> {
        if !self.running || self.ended {
            return Err(GameError::NotRunning);
        }
        let seat = self
            .seat_of_connection(connection_id)
            .ok_or(GameError::NotSeated)?;
        if seat != self.turn_index {
            return Err(GameError::NotYourTurn);
        }

        let checked = placement::validate(&self.board, placements)?;

        // Every batch tile must come out of a distinct rack slot that
        // actually holds that letter; anything else would mint tiles out of
        // thin air and break tile conservation.
        let rack = &self.players[seat].rack;
        let mut used_slots = HashSet::new();
        for p in &checked {
            if !used_slots.insert(p.rack_slot) || rack.letter_at(p.rack_slot) != Some(p.letter) {
                return Err(GameError::TileNotInRack {
                    slot: p.rack_slot,
                    letter: p.letter,
                });
            }
        }

        let main_tiles = words::extract_main_word(&self.board, &checked);
        let mut words_to_confirm = Vec::new();
        let main_text = words::word_text(&main_tiles);
        if main_text.len() >= 2 {
            words_to_confirm.push(main_text);
        }
        for cross in words::extract_cross_words(&self.board, &checked) {
            words_to_confirm.push(cross.text());
        }

        let score = scoring::score_move(&self.board, &self.bonus_layout, &checked);

        Ok(StagedMove {
            seat,
            placements: checked,
            words: words_to_confirm,
            score,
        })
    }

    /// Applies a staged move whose words have all been confirmed: commits
    /// the tiles, consumes the rack slots, banks the score, stores the
    /// definitions and advances the state machine.
    pub fn commit_move(
        &mut self,
        staged: StagedMove,
        definitions: HashMap<String, Vec<String>>,
    ) {
        let seat = staged.seat;
        self.players[seat].score += staged.score.total();
        for p in &staged.placements {
            self.board.place(p.row, p.col, p.letter);
            self.players[seat].rack.take(p.rack_slot);
        }
        self.last_definitions = definitions;
        self.finish_turn(seat);
    }

    /// Refills the acting player's rack (if possible) and advances.
    pub fn skip_turn(&mut self, connection_id: &str) -> Result<(), GameError> {
        if !self.running || self.ended {
            return Err(GameError::NotRunning);
        }
        let seat = self
            .seat_of_connection(connection_id)
            .ok_or(GameError::NotSeated)?;
        if seat != self.turn_index {
            return Err(GameError::NotYourTurn);
        }
        self.finish_turn(seat);
        Ok(())
    }

    /// Rack refill, final-phase bookkeeping and turn/round advance shared
    /// by committed moves and skips.
    fn finish_turn(&mut self, seat: usize) {
        let Game { players, tile_bag, .. } = self;
        let fully_refilled = players[seat].rack.refill_from(tile_bag);

        if !fully_refilled && !self.final_phase {
            self.final_phase = true;
            self.final_starter = seat;
            self.final_remaining = self.players.len().saturating_sub(1);
            debug!(
                final_starter = seat,
                final_remaining = self.final_remaining,
                "Tile bag exhausted, entering final phase"
            );
        }

        if self.final_phase {
            if seat != self.final_starter {
                self.final_remaining = self.final_remaining.saturating_sub(1);
            }
            if self.final_remaining == 0 {
                // End immediately; the turn pointer stays where it is.
                self.end_game();
                return;
            }
        }

        self.turn_index = (self.turn_index + 1) % self.players.len();
        if self.turn_index == self.round_start_index {
            self.current_round += 1;
            debug!(round = self.current_round, "Round advanced");
        }
        if self.current_round >= self.max_rounds {
            self.end_game();
        }
    }

    /// Replaces the player's slot order if the proposal holds exactly the
    /// letters the server knows about. Anything else is ignored without an
    /// error, so a probing client learns nothing about the real rack.
    pub fn reorder_rack(
        &mut self,
        connection_id: &str,
        proposed: [Option<char>; RACK_SIZE],
    ) -> bool {
        let Some(seat) = self.seat_of_connection(connection_id) else {
            return false;
        };
        if seat != self.turn_index {
            return false;
        }
        let rack = &mut self.players[seat].rack;
        if !rack.is_permutation(&proposed) {
            return false;
        }
        rack.reorder(proposed);
        true
    }

    /// Removes a disconnected player. Returns true when a seat was freed;
    /// the caller decides whether to drop the now-empty room.
    pub fn remove_connection(&mut self, connection_id: &str) -> bool {
        let Some(seat) = self.seat_of_connection(connection_id) else {
            return false;
        };
        self.players.remove(seat);
        if self.turn_index >= self.players.len() {
            self.turn_index = 0;
        }
        if self.round_start_index >= self.players.len() {
            self.round_start_index = 0;
        }
        if self.final_starter >= self.players.len() {
            self.final_starter = 0;
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn end_game(&mut self) {
        let top = self.players.iter().map(|p| p.score).max().unwrap_or(0);
        self.winners = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.score == top)
            .map(|(seat, _)| seat)
            .collect();
        self.running = false;
        self.ended = true;
        debug!(winners = ?self.winners, top_score = top, "Game ended");
    }

    /// Tiles currently accounted for anywhere: bag + board + racks.
    /// Constant for the life of a room once all seats are taken.
    pub fn total_tiles(&self) -> usize {
        self.tile_bag.len()
            + self.board.tile_count()
            + self
                .players
                .iter()
                .map(|p| p.rack.occupied_count())
                .sum::<usize>()
    }
}

fn generate_join_code() -> String {
    let mut rng = rand::rng();
    (0..JOIN_CODE_LEN)
        .map(|_| JOIN_CODE_ALPHABET[rng.random_range(0..JOIN_CODE_ALPHABET.len())] as char)
        .collect()
}
