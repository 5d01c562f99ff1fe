use static_assertions::const_assert;

use crate::{HEIGHT, WIDTH};

/// log2 of the number of entries in a [`TranspositionTable`]
pub const TABLE_SIZE_LOG2: usize = 23;
const TABLE_SIZE: usize = 1 << TABLE_SIZE_LOG2;
const INDEX_MASK: u64 = TABLE_SIZE as u64 - 1;

// the bits of a key above the index must fit in the stored u32 for lookups to be exact
const_assert!(WIDTH * (HEIGHT + 1) - TABLE_SIZE_LOG2 <= 32);

/// A fixed size cache of search bounds, indexed by position key
///
/// The low bits of a key pick the slot and the remaining high bits are stored
/// for verification, so a hit always belongs to the requested position. A new
/// entry overwrites whatever was in its slot.
///
/// A stored value of 0 marks an empty slot.
#[derive(Clone)]
pub struct TranspositionTable {
    keys: Vec<u32>,
    values: Vec<u8>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self {
            keys: vec![0; TABLE_SIZE],
            values: vec![0; TABLE_SIZE],
        }
    }

    pub fn set(&mut self, key: u64, value: u8) {
        let i = Self::index(key);
        self.keys[i] = (key >> TABLE_SIZE_LOG2) as u32;
        self.values[i] = value;
    }

    pub fn get(&self, key: u64) -> u8 {
        let i = Self::index(key);
        if self.keys[i] == (key >> TABLE_SIZE_LOG2) as u32 {
            self.values[i]
        } else {
            0
        }
    }

    /// Empties every slot
    pub fn clear(&mut self) {
        self.keys.iter_mut().for_each(|key| *key = 0);
        self.values.iter_mut().for_each(|value| *value = 0);
    }

    fn index(key: u64) -> usize {
        (key & INDEX_MASK) as usize
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}
