use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::board::Board;

/// A proposed tile placement as submitted by a client, before validation.
///
/// Coordinates are kept signed here so that out-of-range input is rejected
/// by the validator instead of being mangled at the deserialization boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub row: i64,
    pub col: i64,
    pub letter: char,
    pub rack_slot: usize,
}

/// A placement that passed validation: coordinates normalized and in bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckedPlacement {
    pub row: usize,
    pub col: usize,
    pub letter: char,
    pub rack_slot: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("no tiles placed")]
    EmptyBatch,
    #[error("placement ({row}, {col}) is outside the board")]
    OutOfBounds { row: i64, col: i64 },
    #[error("tiles must share a single row or column")]
    NotCollinear,
    #[error("tiles must be contiguous; gap at ({row}, {col})")]
    Gap { row: usize, col: usize },
    #[error("first move must cover the center square")]
    CenterRequired,
    #[error("cell ({row}, {col}) is already filled")]
    CellOccupied { row: usize, col: usize },
    #[error("two tiles target cell ({row}, {col})")]
    DuplicateCell { row: usize, col: usize },
}

/// Checks a proposed batch against the committed board state.
///
/// The rules run in a fixed order and the first failure rejects the whole
/// batch; on success the normalized placements are returned and nothing has
/// been mutated.
pub fn validate(board: &Board, placements: &[Placement]) -> Result<Vec<CheckedPlacement>, PlacementError> {
    // Rule 1: non-empty batch, every coordinate inside the board.
    if placements.is_empty() {
        return Err(PlacementError::EmptyBatch);
    }
    let bound = board.size() as i64;
    let mut checked = Vec::with_capacity(placements.len());
    for p in placements {
        if p.row < 0 || p.col < 0 || p.row >= bound || p.col >= bound {
            return Err(PlacementError::OutOfBounds {
                row: p.row,
                col: p.col,
            });
        }
        checked.push(CheckedPlacement {
            row: p.row as usize,
            col: p.col as usize,
            letter: p.letter,
            rack_slot: p.rack_slot,
        });
    }

    // Rule 2: a single shared row or column. One tile satisfies both.
    let same_row = checked.iter().all(|p| p.row == checked[0].row);
    let same_col = checked.iter().all(|p| p.col == checked[0].col);
    if !same_row && !same_col {
        return Err(PlacementError::NotCollinear);
    }

    // Rule 3: the inclusive span between the extreme coordinates must be
    // covered by a new placement or an existing letter at every cell.
    let covered = |row: usize, col: usize| {
        checked.iter().any(|p| p.row == row && p.col == col) || board.get(row, col).is_some()
    };
    if same_row {
        let row = checked[0].row;
        let min = checked.iter().map(|p| p.col).min().unwrap();
        let max = checked.iter().map(|p| p.col).max().unwrap();
        for col in min..=max {
            if !covered(row, col) {
                return Err(PlacementError::Gap { row, col });
            }
        }
    } else {
        let col = checked[0].col;
        let min = checked.iter().map(|p| p.row).min().unwrap();
        let max = checked.iter().map(|p| p.row).max().unwrap();
        for row in min..=max {
            if !covered(row, col) {
                return Err(PlacementError::Gap { row, col });
            }
        }
    }

    // Rule 4: the first move of the game must cover the center square.
    if board.is_empty() {
        let center = board.size() / 2;
        if !checked.iter().any(|p| p.row == center && p.col == center) {
            return Err(PlacementError::CenterRequired);
        }
    }

    // Rule 5: no committed cell may be targeted, and no cell twice.
    let mut seen = HashSet::new();
    for p in &checked {
        if board.get(p.row, p.col).is_some() {
            return Err(PlacementError::CellOccupied { row: p.row, col: p.col });
        }
        if !seen.insert((p.row, p.col)) {
            return Err(PlacementError::DuplicateCell { row: p.row, col: p.col });
        }
    }

    Ok(checked)
}
