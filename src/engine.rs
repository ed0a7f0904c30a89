//! The caller-facing query surface
//!
//! An [`Engine`] is built once (optionally loading an opening book) and then
//! queried many times with move sequences. Queries replay the sequence into a
//! bitboard, score every column exactly and pick a best column, breaking ties
//! uniformly at random.

use anyhow::{anyhow, Result};
use log::warn;
use rand::seq::SliceRandom;

use crate::bitboard::BitBoard;
use crate::opening_book::OpeningBook;
use crate::solver::{Solver, INVALID_MOVE};
use crate::WIDTH;

pub struct Engine {
    solver: Solver,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
        }
    }

    /// Creates an `Engine` with an opening book loaded from `buffer`
    ///
    /// A buffer that fails validation is logged and ignored; the engine then
    /// falls back to full search for all positions.
    pub fn with_opening_book(buffer: &[u8]) -> Self {
        let solver = match OpeningBook::load(buffer) {
            Ok(book) => Solver::new().with_opening_book(book),
            Err(err) => {
                warn!("{}, continuing without opening book", err);
                Solver::new()
            }
        };
        Self { solver }
    }

    /// Scores every column after replaying `sequence`
    ///
    /// `sequence` is a string of 0-indexed column digits. Unplayable columns
    /// score [`INVALID_MOVE`].
    pub fn analyze(&mut self, sequence: &str, weak: bool) -> Result<[i32; WIDTH]> {
        let board = BitBoard::from_moves(sequence)?;
        Ok(self.solver.analyze(&board, weak))
    }

    /// Returns the optimal column to play after replaying `sequence`
    ///
    /// Ties between equally good columns are broken uniformly at random.
    pub fn best_move(&mut self, sequence: &str) -> Result<usize> {
        let scores = self.analyze(sequence, false)?;

        let best = *scores
            .iter()
            .max()
            .filter(|&&score| score != INVALID_MOVE)
            .ok_or_else(|| anyhow!("no playable column, the board is full"))?;

        let candidates: Vec<usize> = (0..WIDTH).filter(|&c| scores[c] == best).collect();
        candidates
            .choose(&mut rand::thread_rng())
            .copied()
            .ok_or_else(|| anyhow!("no playable column, the board is full"))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
