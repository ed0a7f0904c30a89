//! A fixed-size direct-mapped cache of search results

/// log2 of the requested table size; the actual size is the next prime up
const LOG_TABLE_SIZE: usize = 23;

pub(crate) fn next_prime(mut n: usize) -> usize {
    fn is_prime(x: usize) -> bool {
        if x < 2 {
            return false;
        }
        let mut i = 2;
        while i * i <= x {
            if x % i == 0 {
                return false;
            }
            i += 1;
        }
        true
    }
    while !is_prime(n) {
        n += 1;
    }
    n
}

/// Direct-mapped map from position key to an encoded score bound
///
/// A write unconditionally overwrites whatever occupies its slot, and a read
/// only trusts a slot whose full key matches, so a collision behaves exactly
/// like a miss. Values are biased to be non-zero; 0 means "absent".
#[derive(Clone)]
pub struct TranspositionTable {
    keys: Vec<u64>,
    values: Vec<u8>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        let size = next_prime(1 << LOG_TABLE_SIZE);
        Self {
            keys: vec![0; size],
            values: vec![0; size],
        }
    }

    pub fn size(&self) -> usize {
        self.keys.len()
    }

    fn index(&self, key: u64) -> usize {
        (key % self.keys.len() as u64) as usize
    }

    pub fn put(&mut self, key: u64, value: u8) {
        let pos = self.index(key);
        self.keys[pos] = key;
        self.values[pos] = value;
    }

    pub fn get(&self, key: u64) -> u8 {
        let pos = self.index(key);
        if self.keys[pos] == key {
            self.values[pos]
        } else {
            0
        }
    }

    pub fn reset(&mut self) {
        for key in self.keys.iter_mut() {
            *key = 0;
        }
        for value in self.values.iter_mut() {
            *value = 0;
        }
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}
