use serde::{Deserialize, Serialize};

use super::board::Board;
use super::placement::CheckedPlacement;

/// Orientation of the placement batch's shared line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// One position of an extracted word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordTile {
    pub letter: Option<char>,
    pub newly_placed: bool,
    pub row: usize,
    pub col: usize,
}

/// A word formed perpendicular to the main axis, anchored at one new tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossWord {
    pub tiles: Vec<WordTile>,
}

impl CrossWord {
    pub fn text(&self) -> String {
        word_text(&self.tiles)
    }
}

pub fn word_text(tiles: &[WordTile]) -> String {
    tiles.iter().filter_map(|tile| tile.letter).collect()
}

/// The axis the batch lies on. A single tile satisfies both; the horizontal
/// reading wins, so its perpendicular word is always found as a cross word.
pub fn main_axis(placements: &[CheckedPlacement]) -> Axis {
    if placements.iter().all(|p| p.row == placements[0].row) {
        Axis::Horizontal
    } else {
        Axis::Vertical
    }
}

fn batch_letter(placements: &[CheckedPlacement], row: usize, col: usize) -> Option<char> {
    placements
        .iter()
        .find(|p| p.row == row && p.col == col)
        .map(|p| p.letter)
}

/// Derives the main word: the batch's bounding span along the shared axis,
/// extended outward in both directions over already-committed letters.
///
/// Must be called on the board state from before the batch is committed.
pub fn extract_main_word(board: &Board, placements: &[CheckedPlacement]) -> Vec<WordTile> {
    let limit = board.size() - 1;
    match main_axis(placements) {
        Axis::Horizontal => {
            let row = placements[0].row;
            let mut min = placements.iter().map(|p| p.col).min().unwrap();
            let mut max = placements.iter().map(|p| p.col).max().unwrap();
            while min > 0 && board.get(row, min - 1).is_some() {
                min -= 1;
            }
            while max < limit && board.get(row, max + 1).is_some() {
                max += 1;
            }
            (min..=max)
                .map(|col| word_tile(board, placements, row, col))
                .collect()
        }
        Axis::Vertical => {
            let col = placements[0].col;
            let mut min = placements.iter().map(|p| p.row).min().unwrap();
            let mut max = placements.iter().map(|p| p.row).max().unwrap();
            while min > 0 && board.get(min - 1, col).is_some() {
                min -= 1;
            }
            while max < limit && board.get(max + 1, col).is_some() {
                max += 1;
            }
            (min..=max)
                .map(|row| word_tile(board, placements, row, col))
                .collect()
        }
    }
}

fn word_tile(board: &Board, placements: &[CheckedPlacement], row: usize, col: usize) -> WordTile {
    match batch_letter(placements, row, col) {
        Some(letter) => WordTile {
            letter: Some(letter),
            newly_placed: true,
            row,
            col,
        },
        None => WordTile {
            letter: board.get(row, col),
            newly_placed: false,
            row,
            col,
        },
    }
}

/// Derives the cross words: for each placement, the perpendicular run of
/// committed letters through it. Runs shorter than two letters are not
/// words. A cross word can only be anchored at a newly placed tile (a
/// committed tile with a perpendicular extension was already scored on the
/// turn that formed it), so iterating per placement finds each exactly once.
pub fn extract_cross_words(board: &Board, placements: &[CheckedPlacement]) -> Vec<CrossWord> {
    let limit = board.size() - 1;
    let axis = main_axis(placements);
    let mut cross_words = Vec::new();

    for anchor in placements {
        let mut tiles = vec![WordTile {
            letter: Some(anchor.letter),
            newly_placed: true,
            row: anchor.row,
            col: anchor.col,
        }];

        match axis {
            // Perpendicular to a horizontal main word is a vertical run.
            Axis::Horizontal => {
                let mut row = anchor.row;
                while row > 0 && board.get(row - 1, anchor.col).is_some() {
                    row -= 1;
                    tiles.insert(
                        0,
                        WordTile {
                            letter: board.get(row, anchor.col),
                            newly_placed: false,
                            row,
                            col: anchor.col,
                        },
                    );
                }
                let mut row = anchor.row;
                while row < limit && board.get(row + 1, anchor.col).is_some() {
                    row += 1;
                    tiles.push(WordTile {
                        letter: board.get(row, anchor.col),
                        newly_placed: false,
                        row,
                        col: anchor.col,
                    });
                }
            }
            Axis::Vertical => {
                let mut col = anchor.col;
                while col > 0 && board.get(anchor.row, col - 1).is_some() {
                    col -= 1;
                    tiles.insert(
                        0,
                        WordTile {
                            letter: board.get(anchor.row, col),
                            newly_placed: false,
                            row: anchor.row,
                            col,
                        },
                    );
                }
                let mut col = anchor.col;
                while col < limit && board.get(anchor.row, col + 1).is_some() {
                    col += 1;
                    tiles.push(WordTile {
                        letter: board.get(anchor.row, col),
                        newly_placed: false,
                        row: anchor.row,
                        col,
                    });
                }
            }
        }

        if tiles.len() >= 2 {
            cross_words.push(CrossWord { tiles });
        }
    }

    cross_words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked(row: usize, col: usize, letter: char) -> CheckedPlacement {
        CheckedPlacement {
            row,
            col,
            letter,
            rack_slot: 0,
        }
    }

    fn board_with(tiles: &[(usize, usize, char)]) -> Board {
        let mut board = Board::new(15);
        for &(row, col, letter) in tiles {
            assert!(board.place(row, col, letter));
        }
        board
    }

    #[test]
    fn test_main_word_on_empty_board() {
        let board = Board::new(15);
        let batch = vec![checked(7, 6, 'C'), checked(7, 7, 'A'), checked(7, 8, 'T')];

        let main = extract_main_word(&board, &batch);
        assert_eq!(word_text(&main), "CAT");
        assert!(main.iter().all(|tile| tile.newly_placed));
        assert!(extract_cross_words(&board, &batch).is_empty());
    }

    #[test]
    fn test_main_word_extends_over_committed_letters() {
        let board = board_with(&[(7, 6, 'C'), (7, 7, 'A'), (7, 8, 'T')]);
        let batch = vec![checked(7, 9, 'S')];

        let main = extract_main_word(&board, &batch);
        assert_eq!(word_text(&main), "CATS");
        let new_flags: Vec<bool> = main.iter().map(|tile| tile.newly_placed).collect();
        assert_eq!(new_flags, vec![false, false, false, true]);
    }

    #[test]
    fn test_single_tile_prefers_horizontal_main_word() {
        let board = board_with(&[(7, 6, 'C'), (7, 7, 'A'), (7, 8, 'T')]);
        let batch = vec![checked(8, 8, 'S')];

        // The horizontal reading of a lone tile is just itself...
        let main = extract_main_word(&board, &batch);
        assert_eq!(word_text(&main), "S");

        // ...and the vertical run through the T shows up as a cross word.
        let crosses = extract_cross_words(&board, &batch);
        assert_eq!(crosses.len(), 1);
        assert_eq!(crosses[0].text(), "TS");
        assert!(!crosses[0].tiles[0].newly_placed);
        assert!(crosses[0].tiles[1].newly_placed);
    }

    #[test]
    fn test_one_cross_word_per_placement() {
        let board = board_with(&[(7, 6, 'C'), (7, 7, 'A'), (7, 8, 'T')]);
        // "ON" laid directly under "CA" forms CO and AN vertically.
        let batch = vec![checked(8, 6, 'O'), checked(8, 7, 'N')];

        let main = extract_main_word(&board, &batch);
        assert_eq!(word_text(&main), "ON");

        let crosses = extract_cross_words(&board, &batch);
        let texts: Vec<String> = crosses.iter().map(|cw| cw.text()).collect();
        assert_eq!(texts, vec!["CO".to_string(), "AN".to_string()]);
    }

    #[test]
    fn test_vertical_main_word_with_horizontal_cross() {
        let board = board_with(&[(7, 6, 'C'), (7, 7, 'A'), (7, 8, 'T')]);
        // "AT" placed vertically below the C, forming "CAT" downward and
        // crossing nothing horizontally except through existing letters.
        let batch = vec![checked(8, 6, 'A'), checked(9, 6, 'T')];

        assert_eq!(main_axis(&batch), Axis::Vertical);
        let main = extract_main_word(&board, &batch);
        assert_eq!(word_text(&main), "CAT");
        assert!(!main[0].newly_placed);
        assert!(main[1].newly_placed);
        assert!(main[2].newly_placed);
    }

    #[test]
    fn test_word_stops_at_board_edge() {
        let board = board_with(&[(0, 1, 'A'), (0, 2, 'T')]);
        let batch = vec![checked(0, 0, 'B')];

        let main = extract_main_word(&board, &batch);
        assert_eq!(word_text(&main), "BAT");
    }
}
