use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of slots in every player rack.
pub const RACK_SIZE: usize = 7;

/// Standard letter frequency table: (letter, copies in a fresh bag).
const TILE_DISTRIBUTION: [(char, usize); 26] = [
    ('A', 9),
    ('B', 2),
    ('C', 2),
    ('D', 4),
    ('E', 12),
    ('F', 2),
    ('G', 3),
    ('H', 2),
    ('I', 9),
    ('J', 1),
    ('K', 1),
    ('L', 4),
    ('M', 2),
    ('N', 6),
    ('O', 8),
    ('P', 2),
    ('Q', 1),
    ('R', 6),
    ('S', 4),
    ('T', 6),
    ('U', 4),
    ('V', 2),
    ('W', 2),
    ('X', 1),
    ('Y', 2),
    ('Z', 1),
];

/// Point value of a letter. Unknown characters score zero.
pub fn letter_points(letter: char) -> u32 {
    match letter.to_ascii_uppercase() {
        'A' | 'E' | 'I' | 'L' | 'N' | 'O' | 'R' | 'S' | 'T' | 'U' => 1,
        'D' | 'G' => 2,
        'B' | 'C' | 'M' | 'P' => 3,
        'F' | 'H' | 'V' | 'W' | 'Y' => 4,
        'K' => 5,
        'J' | 'X' => 8,
        'Q' | 'Z' => 10,
        _ => 0,
    }
}

/// The remaining undrawn letters of a game.
///
/// Tiles are drawn without replacement at a uniformly random index; the bag
/// is never replenished once the game has started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileBag {
    tiles: Vec<char>,
}

impl TileBag {
    /// A fresh bag seeded from the standard distribution (100 tiles).
    pub fn standard() -> Self {
        let mut tiles = Vec::with_capacity(100);
        for (letter, count) in TILE_DISTRIBUTION {
            for _ in 0..count {
                tiles.push(letter);
            }
        }
        Self { tiles }
    }

    /// An empty bag.
    pub fn empty() -> Self {
        Self { tiles: Vec::new() }
    }

    /// A bag holding exactly the given letters, for custom distributions
    /// and for forcing endgame conditions in tests.
    pub fn from_letters(tiles: Vec<char>) -> Self {
        Self { tiles }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Draws one tile at random, or None if the bag is exhausted.
    pub fn draw(&mut self) -> Option<char> {
        if self.tiles.is_empty() {
            return None;
        }
        let idx = rand::rng().random_range(0..self.tiles.len());
        Some(self.tiles.swap_remove(idx))
    }

    /// Draws up to `count` tiles; returns fewer when the bag runs dry.
    pub fn draw_up_to(&mut self, count: usize) -> Vec<char> {
        let mut drawn = Vec::with_capacity(count.min(self.tiles.len()));
        for _ in 0..count {
            match self.draw() {
                Some(tile) => drawn.push(tile),
                None => break,
            }
        }
        drawn
    }
}

/// A player's hand: exactly [`RACK_SIZE`] slots, each a letter or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rack {
    slots: [Option<char>; RACK_SIZE],
}

impl Default for Rack {
    fn default() -> Self {
        Self::empty()
    }
}

impl Rack {
    pub fn empty() -> Self {
        Self {
            slots: [None; RACK_SIZE],
        }
    }

    pub fn slots(&self) -> &[Option<char>; RACK_SIZE] {
        &self.slots
    }

    /// The letter currently held in `slot`, if any.
    pub fn letter_at(&self, slot: usize) -> Option<char> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn empty_slot_count(&self) -> usize {
        RACK_SIZE - self.occupied_count()
    }

    /// Empties `slot` and returns the letter that was in it.
    pub fn take(&mut self, slot: usize) -> Option<char> {
        self.slots.get_mut(slot).and_then(|s| s.take())
    }

    /// Fills empty slots in slot order from `bag`, one tile per slot.
    ///
    /// Returns true when every slot ended up occupied; false means the bag
    /// ran dry mid-refill, which is the final-phase trigger.
    pub fn refill_from(&mut self, bag: &mut TileBag) -> bool {
        for slot in self.slots.iter_mut() {
            if slot.is_none() {
                match bag.draw() {
                    Some(tile) => *slot = Some(tile),
                    None => return false,
                }
            }
        }
        true
    }

    /// Sorted multiset of the letters currently held.
    fn letter_multiset(&self) -> Vec<char> {
        let mut letters: Vec<char> = self.slots.iter().filter_map(|slot| *slot).collect();
        letters.sort_unstable();
        letters
    }

    /// Whether `proposed` holds exactly the same letters as this rack,
    /// in any order (empty slots are interchangeable).
    pub fn is_permutation(&self, proposed: &[Option<char>; RACK_SIZE]) -> bool {
        let mut proposed_letters: Vec<char> =
            proposed.iter().filter_map(|slot| *slot).collect();
        proposed_letters.sort_unstable();
        proposed_letters == self.letter_multiset()
    }

    /// Replaces the slot order wholesale. Callers must have verified the
    /// proposal with [`Rack::is_permutation`] first.
    pub fn reorder(&mut self, proposed: [Option<char>; RACK_SIZE]) {
        self.slots = proposed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_bag_has_100_tiles() {
        let bag = TileBag::standard();
        assert_eq!(bag.len(), 100);
    }

    #[test]
    fn test_draw_removes_tiles() {
        let mut bag = TileBag::standard();
        let tile = bag.draw();
        assert!(tile.is_some());
        assert_eq!(bag.len(), 99);
        assert!(tile.unwrap().is_ascii_uppercase());
    }

    #[test]
    fn test_draw_up_to_caps_at_remaining() {
        let mut bag = TileBag::standard();
        let drawn = bag.draw_up_to(150);
        assert_eq!(drawn.len(), 100);
        assert!(bag.is_empty());
        assert!(bag.draw().is_none());
    }

    #[test]
    fn test_letter_points_table() {
        assert_eq!(letter_points('A'), 1);
        assert_eq!(letter_points('D'), 2);
        assert_eq!(letter_points('C'), 3);
        assert_eq!(letter_points('H'), 4);
        assert_eq!(letter_points('K'), 5);
        assert_eq!(letter_points('X'), 8);
        assert_eq!(letter_points('Q'), 10);
        assert_eq!(letter_points('q'), 10);
        assert_eq!(letter_points('?'), 0);
    }

    #[test]
    fn test_refill_fills_in_slot_order() {
        let mut rack = Rack::empty();
        rack.slots[1] = Some('A');
        rack.slots[4] = Some('B');

        let mut bag = TileBag::standard();
        let fully = rack.refill_from(&mut bag);

        assert!(fully);
        assert_eq!(rack.occupied_count(), RACK_SIZE);
        assert_eq!(rack.letter_at(1), Some('A'));
        assert_eq!(rack.letter_at(4), Some('B'));
        assert_eq!(bag.len(), 95);
    }

    #[test]
    fn test_refill_reports_short_draw() {
        let mut rack = Rack::empty();
        // Two tiles for five empty slots.
        let mut bag = TileBag::from_letters(vec!['E', 'S']);
        rack.slots[0] = Some('A');
        rack.slots[3] = Some('T');

        let fully = rack.refill_from(&mut bag);

        assert!(!fully);
        assert!(bag.is_empty());
        assert_eq!(rack.occupied_count(), 4);
    }

    #[test]
    fn test_permutation_check() {
        let mut rack = Rack::empty();
        rack.slots = [Some('A'), Some('B'), None, Some('C'), None, None, None];

        // Same letters, different order and different empty-slot positions.
        let ok = [None, Some('C'), Some('A'), None, None, Some('B'), None];
        assert!(rack.is_permutation(&ok));

        // Letter swapped out.
        let bad = [None, Some('C'), Some('A'), None, None, Some('Z'), None];
        assert!(!rack.is_permutation(&bad));

        // Letter dropped.
        let short = [None, Some('C'), Some('A'), None, None, None, None];
        assert!(!rack.is_permutation(&short));

        // Letter duplicated.
        let dup = [
            Some('A'),
            Some('A'),
            Some('B'),
            Some('C'),
            None,
            None,
            None,
        ];
        assert!(!rack.is_permutation(&dup));
    }

    #[test]
    fn test_take_empties_slot() {
        let mut rack = Rack::empty();
        rack.slots[2] = Some('Q');
        assert_eq!(rack.take(2), Some('Q'));
        assert_eq!(rack.take(2), None);
        assert_eq!(rack.take(99), None);
    }
}
