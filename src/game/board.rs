use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Minimum and maximum supported board sizes.
pub const MIN_BOARD_SIZE: usize = 5;
pub const MAX_BOARD_SIZE: usize = 25;
pub const DEFAULT_BOARD_SIZE: usize = 15;

/// Kind of premium square. The short codes are the wire/debug form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
pub enum Bonus {
    #[strum(serialize = "DL")]
    DoubleLetter,
    #[strum(serialize = "TL")]
    TripleLetter,
    #[strum(serialize = "DW")]
    DoubleWord,
    #[strum(serialize = "TW")]
    TripleWord,
    /// The middle square; scores as a double-word bonus.
    #[strum(serialize = "CENTER")]
    Center,
}

/// Immutable square -> bonus mapping, fixed for the life of a room.
///
/// The pattern is generated from the board size: premium positions are
/// expressed as rules over edge-folded coordinates, which reproduces the
/// classic layout on a 15x15 board and scales to any supported size with
/// the Center square always at (size/2, size/2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusLayout {
    size: usize,
    squares: Vec<Option<Bonus>>,
}

impl BonusLayout {
    pub fn standard(size: usize) -> Self {
        let squares = (0..size * size)
            .map(|idx| bonus_for(idx / size, idx % size, size))
            .collect();
        Self { size, squares }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The bonus at (row, col), if the square is premium.
    pub fn at(&self, row: usize, col: usize) -> Option<Bonus> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.squares[row * self.size + col]
    }
}

fn bonus_for(row: usize, col: usize, size: usize) -> Option<Bonus> {
    let center = size / 2;
    if row == center && col == center {
        return Some(Bonus::Center);
    }

    // Fold into one quadrant: distance from the nearest edge on each axis.
    let c = center as i64;
    let r = row.min(size - 1 - row) as i64;
    let q = col.min(size - 1 - col) as i64;

    if (r == 0 && q == 0) || (r == 0 && q == c) || (r == c && q == 0) {
        return Some(Bonus::TripleWord);
    }
    if (r == c - 2 && q == c - 2) || (r == 1 && q == c - 2) || (r == c - 2 && q == 1) {
        return Some(Bonus::TripleLetter);
    }
    if r == q && r >= 1 && r <= c - 3 {
        return Some(Bonus::DoubleWord);
    }
    let double_letter = [
        (0, c - 4),
        (c - 4, 0),
        (2, c - 1),
        (c - 1, 2),
        (c - 1, c - 1),
        (c - 4, c),
        (c, c - 4),
    ];
    if double_letter.contains(&(r, q)) {
        return Some(Bonus::DoubleLetter);
    }
    None
}

/// The committed letters of a game: an N x N grid, append-only.
///
/// A filled cell is never cleared or overwritten for the life of the room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    cells: Vec<Option<char>>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> Option<char> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.cells[row * self.size + col]
    }

    /// Commits a letter to an empty cell. Returns false (and leaves the
    /// board untouched) if the cell is out of bounds or already filled.
    pub fn place(&mut self, row: usize, col: usize, letter: char) -> bool {
        if row >= self.size || col >= self.size {
            return false;
        }
        let cell = &mut self.cells[row * self.size + col];
        if cell.is_some() {
            return false;
        }
        *cell = Some(letter);
        true
    }

    /// Whether no tile has been committed yet (first-move state).
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_none())
    }

    pub fn tile_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Row-major snapshot for broadcasting.
    pub fn rows(&self) -> Vec<Vec<Option<char>>> {
        self.cells
            .chunks(self.size)
            .map(|row| row.to_vec())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_classic_15_layout_spots() {
        let layout = BonusLayout::standard(15);

        assert_eq!(layout.at(7, 7), Some(Bonus::Center));
        assert_eq!(layout.at(0, 0), Some(Bonus::TripleWord));
        assert_eq!(layout.at(0, 7), Some(Bonus::TripleWord));
        assert_eq!(layout.at(14, 14), Some(Bonus::TripleWord));
        assert_eq!(layout.at(1, 1), Some(Bonus::DoubleWord));
        assert_eq!(layout.at(13, 13), Some(Bonus::DoubleWord));
        assert_eq!(layout.at(5, 5), Some(Bonus::TripleLetter));
        assert_eq!(layout.at(1, 5), Some(Bonus::TripleLetter));
        assert_eq!(layout.at(0, 3), Some(Bonus::DoubleLetter));
        assert_eq!(layout.at(8, 8), Some(Bonus::DoubleLetter));
        assert_eq!(layout.at(7, 3), Some(Bonus::DoubleLetter));

        // The squares flanking the center along row 7 are plain.
        assert_eq!(layout.at(7, 6), None);
        assert_eq!(layout.at(7, 8), None);
    }

    #[test]
    fn test_layout_is_symmetric() {
        let layout = BonusLayout::standard(15);
        for row in 0..15 {
            for col in 0..15 {
                let bonus = layout.at(row, col);
                assert_eq!(bonus, layout.at(14 - row, col));
                assert_eq!(bonus, layout.at(row, 14 - col));
            }
        }
    }

    #[test]
    fn test_center_follows_board_size() {
        for size in [5, 9, 15, 21, 25] {
            let layout = BonusLayout::standard(size);
            assert_eq!(layout.at(size / 2, size / 2), Some(Bonus::Center));
        }
    }

    #[test]
    fn test_bonus_codes_round_trip() {
        for (bonus, code) in [
            (Bonus::DoubleLetter, "DL"),
            (Bonus::TripleLetter, "TL"),
            (Bonus::DoubleWord, "DW"),
            (Bonus::TripleWord, "TW"),
            (Bonus::Center, "CENTER"),
        ] {
            assert_eq!(bonus.to_string(), code);
            assert_eq!(Bonus::from_str(code).unwrap(), bonus);
        }
    }

    #[test]
    fn test_board_is_append_only() {
        let mut board = Board::new(15);
        assert!(board.is_empty());

        assert!(board.place(7, 7, 'A'));
        assert!(!board.is_empty());
        assert_eq!(board.get(7, 7), Some('A'));
        assert_eq!(board.tile_count(), 1);

        // A filled cell is never overwritten.
        assert!(!board.place(7, 7, 'B'));
        assert_eq!(board.get(7, 7), Some('A'));

        // Out of bounds is refused, not panicked on.
        assert!(!board.place(15, 0, 'C'));
        assert_eq!(board.get(15, 0), None);
    }
}
