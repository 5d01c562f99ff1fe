//! Precomputed scores that let the solver skip searching well-known positions

use std::cmp::Ordering;

use crate::bitboard::BitBoard;

/// A source of precomputed position scores
///
/// Keys are [`BitBoard::key`] values and scores follow the solver's exact
/// scoring convention, from the point of view of the player to move.
pub trait OpeningBook {
    fn lookup(&self, key: u64) -> Option<i32>;
}

/// An opening book held in memory as a sorted list of keys
#[derive(Clone, Default)]
pub struct MemoryBook {
    keys: Vec<u64>,
    scores: Vec<i8>,
}

impl MemoryBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a book from `(position, score)` pairs, later entries replacing earlier ones
    pub fn from_scores<I: IntoIterator<Item = (BitBoard, i32)>>(entries: I) -> Self {
        let mut book = Self::new();
        for (board, score) in entries {
            book.insert(board.key(), score);
        }
        book
    }

    pub fn insert(&mut self, key: u64, score: i32) {
        let score = score as i8;
        match self.keys.binary_search(&key) {
            Ok(i) => self.scores[i] = score,
            Err(i) => {
                self.keys.insert(i, key);
                self.scores.insert(i, score);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl OpeningBook for MemoryBook {
    fn lookup(&self, key: u64) -> Option<i32> {
        // variables for binary search state
        let (mut low, mut high) = (0, self.keys.len());

        while low < high {
            let mid = low + (high - low) / 2;
            match key.cmp(&self.keys[mid]) {
                Ordering::Less => high = mid,
                Ordering::Greater => low = mid + 1,
                Ordering::Equal => return Some(self.scores[mid] as i32),
            }
        }
        None
    }
}
