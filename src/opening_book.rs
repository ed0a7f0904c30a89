//! A read-only perfect-hash table of precomputed scores for shallow positions
//!
//! The book is loaded once from a byte buffer produced by an external asset
//! pipeline. Layout: a 6-byte header (width, height, depth, key byte-width,
//! value byte-width, log2 of the table size), then one truncated key per hash
//! slot, then one value byte per hash slot. The table size is the smallest
//! prime at or above the requested power of two.

use anyhow::{anyhow, Result};
use byteorder::ReadBytesExt;

use crate::bitboard::BitBoard;
use crate::transposition_table::next_prime;
use crate::{HEIGHT, WIDTH};

/// Deepest book this implementation can probe
///
/// The base-3 position key uses one digit per stone plus one separator digit
/// per column, and 3^41 no longer fits in a u64: 40 digits leave room for at
/// most 33 stones.
pub const MAX_BOOK_DEPTH: i32 = 33;

#[derive(Clone, Debug)]
pub struct OpeningBook {
    keys: Vec<u8>,
    values: Vec<u8>,
    key_bytes: usize,
    size: usize,
    // positions with more moves than this are not covered
    depth: i32,
}

impl OpeningBook {
    /// Parses and validates an opening book buffer
    ///
    /// Any header violation is reported as an error; the caller decides
    /// whether to degrade to bookless search or abort.
    pub fn load(buffer: &[u8]) -> Result<Self> {
        let mut header = buffer;

        let width = header.read_u8()? as usize;
        if width != WIDTH {
            return Err(anyhow!(
                "unable to load opening book: invalid width (found: {}, expected: {})",
                width,
                WIDTH
            ));
        }
        let height = header.read_u8()? as usize;
        if height != HEIGHT {
            return Err(anyhow!(
                "unable to load opening book: invalid height (found: {}, expected: {})",
                height,
                HEIGHT
            ));
        }
        let depth = header.read_i8()? as i32;
        if depth > MAX_BOOK_DEPTH {
            return Err(anyhow!(
                "unable to load opening book: invalid depth (found: {}, max supported: {})",
                depth,
                MAX_BOOK_DEPTH
            ));
        }
        let key_bytes = header.read_u8()? as usize;
        if key_bytes == 0 || key_bytes > 8 {
            return Err(anyhow!(
                "unable to load opening book: invalid internal key size (found: {})",
                key_bytes
            ));
        }
        let value_bytes = header.read_u8()? as usize;
        if value_bytes != 1 {
            return Err(anyhow!(
                "unable to load opening book: invalid value size (found: {}, expected: 1)",
                value_bytes
            ));
        }
        let log_size = header.read_u8()? as usize;
        if log_size > 40 {
            return Err(anyhow!(
                "unable to load opening book: invalid log2(size) (found: {})",
                log_size
            ));
        }

        let size = next_prime(1 << log_size);
        let keys_offset = 6;
        let values_offset = keys_offset + size * key_bytes;
        let end = values_offset + size * value_bytes;
        if buffer.len() < end {
            return Err(anyhow!(
                "unable to load opening book: buffer too short (found: {} bytes, expected: {})",
                buffer.len(),
                end
            ));
        }

        Ok(Self {
            keys: buffer[keys_offset..values_offset].to_vec(),
            values: buffer[values_offset..end].to_vec(),
            key_bytes,
            size,
            depth,
        })
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Looks up the position's canonical base-3 key
    ///
    /// Returns the stored value byte, or 0 when the position is deeper than
    /// the book or the truncated key at the probed slot does not match.
    pub fn get(&self, board: &BitBoard) -> i32 {
        if board.num_moves() as i32 > self.depth {
            return 0;
        }
        let key = board.key3();

        let pos = (key % self.size as u64) as usize;
        let stored = &self.keys[pos * self.key_bytes..(pos + 1) * self.key_bytes];

        // stored keys are truncated little-endian, so only the low bytes count
        let probe = key.to_le_bytes();
        if stored != &probe[..self.key_bytes] {
            return 0;
        }
        self.values[pos] as i32
    }
}
