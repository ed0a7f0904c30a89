//! An agent to solve the game of Connect 4

use crate::{bitboard::*, opening_book::*, transposition_table::*, HEIGHT, WIDTH};

/// The minimum possible score of a position
pub const MIN_SCORE: i32 = -((WIDTH * HEIGHT) as i32) / 2 + 3;
/// The maximum possible score of a postion
pub const MAX_SCORE: i32 = ((WIDTH * HEIGHT) as i32 + 1) / 2 - 3;

/// Score assigned by [`Solver::analyze`] to columns that cannot be played
pub const INVALID_MOVE: i32 = -1000;

pub(crate) struct MoveSorter {
    size: usize,
    // move bitmap and heuristic score
    moves: [(u64, i32); WIDTH],
}

impl MoveSorter {
    pub fn new() -> Self {
        Self {
            size: 0,
            moves: [(0, 0); WIDTH],
        }
    }
    pub fn push(&mut self, new_move: u64, score: i32) {
        let mut pos = self.size;
        self.size += 1;
        while pos != 0 && self.moves[pos - 1].1 > score {
            self.moves[pos] = self.moves[pos - 1];
            pos -= 1;
        }
        self.moves[pos] = (new_move, score);
    }
}
impl Iterator for MoveSorter {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        match self.size {
            0 => None,
            _ => {
                self.size -= 1;
                Some(self.moves[self.size].0)
            }
        }
    }
}

/// Returns a slice ordering the columns from the middle outwards, as
/// the middle columns are often better moves
pub const fn move_order() -> [usize; WIDTH] {
    let mut move_order = [0; WIDTH];
    let mut i = 0;
    while i < WIDTH {
        move_order[i] = (WIDTH / 2) + (i % 2) * (i / 2 + 1) - (1 - i % 2) * (i / 2);
        i += 1;
    }
    move_order
}

/// An agent to solve Connect 4 positions
///
/// # Notes
/// This agent uses a classical game tree search with various optimisations to
/// find the mathematically best move(s) in any position, thus 'solving' the game
///
/// # Position Scoring
/// A position is scored by how far a forced win is from the end of the game for either player.
/// If the first player wins with their final placed tile (their 21st tile on a 7x6 board)
/// the score is 1, or -1 if the second player wins with their final tile. Earlier wins
/// have scores further from 0, up to 18/-18, where a player wins with their 4th tile. A drawn
/// position has a score of 0
pub struct Solver {
    /// The number of nodes searched by this `Solver` so far (for diagnostics only)
    pub node_count: usize,
    transposition_table: TranspositionTable,
    opening_book: Option<OpeningBook>,
}

impl Solver {
    /// Creates a new `Solver` with an empty transposition table and no opening book
    pub fn new() -> Self {
        Self {
            node_count: 0,
            transposition_table: TranspositionTable::new(),
            opening_book: None,
        }
    }

    /// Adds an opening book to an existing `Solver`
    pub fn with_opening_book(mut self, opening_book: OpeningBook) -> Self {
        self.opening_book = Some(opening_book);
        self
    }

    /// Clears the transposition table
    pub fn reset(&mut self) {
        self.transposition_table.reset();
    }

    /// Performs game tree search over the window `[alpha, beta]`
    ///
    /// Returns the score of the position (see [Position Scoring]). The caller
    /// must never pass a position where the current player can win this move:
    /// `solve` short-circuits those at the root and child nodes only ever come
    /// from `non_losing_moves`.
    ///
    /// [Position Scoring]: #position-scoring
    fn negamax(&mut self, board: BitBoard, mut alpha: i32, mut beta: i32) -> i32 {
        self.node_count += 1;

        // look for moves that don't give the opponent a next turn win
        let non_losing_moves = board.non_losing_moves();
        if non_losing_moves == 0 {
            return -(((WIDTH * HEIGHT) as i32 - board.num_moves() as i32) / 2);
        }

        // check for draw: neither player can win with two tiles left to place
        if board.num_moves() >= WIDTH * HEIGHT - 2 {
            return 0;
        }

        // clamp the window to the scores still achievable at this depth
        let min = -(((WIDTH * HEIGHT - 2 - board.num_moves()) as i32) / 2);
        if alpha < min {
            alpha = min;
            if alpha >= beta {
                return alpha;
            }
        }
        let max = ((WIDTH * HEIGHT - 1 - board.num_moves()) as i32) / 2;
        if beta > max {
            beta = max;
            if alpha >= beta {
                return beta;
            }
        }

        // try to fetch the upper/lower bound of the score from the transposition table
        let key = board.key();
        let value = self.transposition_table.get(key) as i32;
        if value != 0 {
            // check if lower bound
            if value > MAX_SCORE - MIN_SCORE + 1 {
                let min = value + 2 * MIN_SCORE - MAX_SCORE - 2;
                if alpha < min {
                    alpha = min;
                    if alpha >= beta {
                        // prune the exploration
                        return alpha;
                    }
                }
            // else upper bound
            } else {
                let max = value + MIN_SCORE - 1;
                if beta > max {
                    beta = max;
                    if alpha >= beta {
                        // prune the exploration
                        return beta;
                    }
                }
            }
        }

        // a book hit is an exact score, no search needed
        if let Some(book) = &self.opening_book {
            let value = book.get(&board);
            if value != 0 {
                return value + MIN_SCORE - 1;
            }
        }

        let mut moves = MoveSorter::new();
        // pushing edge columns first reduces the amount of sorting
        // as these moves are worse on average
        for i in (0..WIDTH).rev() {
            let column = move_order()[i];
            let candidate = non_losing_moves & BitBoard::column_mask(column);
            if candidate != 0 {
                moves.push(candidate, board.move_score(candidate));
            }
        }

        // search the next level of the tree
        for move_bitmap in moves {
            let mut next = board;
            next.play(move_bitmap);
            // the search window is flipped for the other player
            let score = -self.negamax(next, -beta, -alpha);
            // if a child node's score is better than beta, we can prune the tree
            // here because a perfect opponent will not pick this branch
            if score >= beta {
                // save a lower bound of the score
                self.transposition_table
                    .put(key, (score + MAX_SCORE - 2 * MIN_SCORE + 2) as u8);
                return score;
            }
            if score > alpha {
                alpha = score;
            }
        }

        // offset of one to prevent storing a 0, which represents an empty entry
        self.transposition_table
            .put(key, (alpha - MIN_SCORE + 1) as u8);
        alpha
    }

    /// Calculates the exact score of a position by null-window bisection
    ///
    /// When `weak` is set only the win/draw/loss classification is resolved
    /// and the result is limited to -1, 0 or 1, which prunes much faster.
    pub fn solve(&mut self, board: BitBoard, weak: bool) -> i32 {
        // negamax assumes no immediate win is available
        if board.can_win_next() {
            return ((WIDTH * HEIGHT + 1 - board.num_moves()) / 2) as i32;
        }

        let mut min = -(((WIDTH * HEIGHT - board.num_moves()) as i32) / 2);
        let mut max = ((WIDTH * HEIGHT + 1 - board.num_moves()) as i32) / 2;
        if weak {
            min = -1;
            max = 1;
        }

        // iteratively narrow the window until the exact score is pinned down
        while min < max {
            let mut med = min + (max - min) / 2;
            // bias the search value towards zero, where answers are cheapest
            if med <= 0 && min.div_euclid(2) < med {
                med = min.div_euclid(2);
            } else if med >= 0 && max.div_euclid(2) > med {
                med = max.div_euclid(2);
            }

            // use a null window to determine if the actual score is greater or less than med
            let r = self.negamax(board, med, med + 1);

            // r is not necessarily the exact true score, but its value indicates
            // whether the true score is above or below the search target
            if r <= med {
                max = r;
            } else {
                min = r;
            }
        }
        // min and max are equal here
        min
    }

    /// Scores every column of the position
    ///
    /// Immediate winning columns are scored directly; every other playable
    /// column is scored by solving the position it leads to. Columns that
    /// cannot be played get [`INVALID_MOVE`].
    pub fn analyze(&mut self, board: &BitBoard, weak: bool) -> [i32; WIDTH] {
        let mut scores = [INVALID_MOVE; WIDTH];
        for (column, score) in scores.iter_mut().enumerate() {
            if board.playable(column) {
                if board.is_winning_move(column) {
                    *score = ((WIDTH * HEIGHT + 1 - board.num_moves()) / 2) as i32;
                } else {
                    let mut next = *board;
                    next.play_column(column);
                    *score = -self.solve(next, weak);
                }
            }
        }
        scores
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}
