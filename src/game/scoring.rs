use serde::{Deserialize, Serialize};

use super::board::{Board, Bonus, BonusLayout};
use super::placement::CheckedPlacement;
use super::tiles::letter_points;
use super::words::{self, Axis, WordTile};

/// Point breakdown of one move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveScore {
    pub main: u32,
    pub cross: u32,
}

impl MoveScore {
    pub fn total(&self) -> u32 {
        self.main + self.cross
    }
}

/// Scores one extracted word.
///
/// Letter bonuses multiply the tile's own value; word bonuses multiply the
/// word's sum, stacking multiplicatively. A square's bonus is consumed the
/// turn a tile is first placed on it: tiles not marked newly placed never
/// contribute a multiplier. Absent letters score zero.
pub fn score_word(layout: &BonusLayout, tiles: &[WordTile]) -> u32 {
    let mut sum = 0;
    let mut word_multiplier = 1;
    for tile in tiles {
        let Some(letter) = tile.letter else {
            continue;
        };
        let mut value = letter_points(letter);
        if tile.newly_placed {
            match layout.at(tile.row, tile.col) {
                Some(Bonus::DoubleLetter) => value *= 2,
                Some(Bonus::TripleLetter) => value *= 3,
                Some(Bonus::DoubleWord) | Some(Bonus::Center) => word_multiplier *= 2,
                Some(Bonus::TripleWord) => word_multiplier *= 3,
                None => {}
            }
        }
        sum += value;
    }
    sum * word_multiplier
}

/// Scores a validated batch against the pre-commit board.
///
/// Pure query: neither the board nor the placements are mutated, so the
/// same call can back both a preview and the authoritative commit.
///
/// A cross word is skipped only when every one of its tiles sits on the
/// main word's own line, where it would merely duplicate the main word of
/// a move that collapsed onto a single line.
pub fn score_move(
    board: &Board,
    layout: &BonusLayout,
    placements: &[CheckedPlacement],
) -> MoveScore {
    let main_tiles = words::extract_main_word(board, placements);
    let main = score_word(layout, &main_tiles);

    let axis = words::main_axis(placements);
    let mut cross = 0;
    for cross_word in words::extract_cross_words(board, placements) {
        let on_main_line = match axis {
            Axis::Horizontal => cross_word
                .tiles
                .iter()
                .all(|tile| tile.row == placements[0].row),
            Axis::Vertical => cross_word
                .tiles
                .iter()
                .all(|tile| tile.col == placements[0].col),
        };
        if on_main_line {
            continue;
        }
        cross += score_word(layout, &cross_word.tiles);
    }

    MoveScore { main, cross }
}
