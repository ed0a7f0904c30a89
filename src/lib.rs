//! A perfect agent for playing or analysing the board game 'Connect 4'
//!
//! This agent uses an optimised game tree search to find the
//! mathematically optimal move for any position on the standard
//! 7x6 board, optionally accelerated by a precomputed opening book.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_solver::engine::Engine;
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let mut engine = Engine::new();
//! let best = engine.best_move("000000334455")?;
//!
//! // both outer columns complete four-in-a-row on the bottom row
//! assert!(best == 2 || best == 6);
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod transposition_table;

pub mod bitboard;

pub mod opening_book;

pub mod solver;

pub mod engine;

mod test;

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

// ensure that the given dimensions fit in a u64 for the bitboard representation
const_assert!(WIDTH * (HEIGHT + 1) < 64);
