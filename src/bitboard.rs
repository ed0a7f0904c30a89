use anyhow::{anyhow, Result};

use crate::{HEIGHT, WIDTH};

mod static_masks {
    use crate::{HEIGHT, WIDTH};

    pub const fn bottom_mask() -> u64 {
        let mut mask = 0;
        let mut column = 0;
        while column < WIDTH {
            mask |= 1 << (column * (HEIGHT + 1));
            column += 1;
        }
        mask
    }
    pub const fn full_board_mask() -> u64 {
        bottom_mask() * ((1 << HEIGHT as u64) - 1)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct BitBoard {
    // mask of the current player's tiles
    player_mask: u64,
    // mask of all tiles
    board_mask: u64,
    num_moves: usize,
}
impl BitBoard {
    pub fn new() -> Self {
        Self {
            player_mask: 0,
            board_mask: 0,
            num_moves: 0,
        }
    }

    /// Replays a sequence of 0-indexed column digits from the empty board
    ///
    /// Errors carry the 1-based index of the first offending move. A move is
    /// rejected if its column is out of range or full, or if it would complete
    /// four-in-a-row (the game would be over before the sequence ends).
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        let mut board = Self::new();

        for (i, column_char) in moves.as_ref().chars().enumerate() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column) if column < WIDTH => {
                    if !board.playable(column) {
                        return Err(anyhow!(
                            "invalid move at position {}: column {} is full",
                            i + 1,
                            column
                        ));
                    }
                    // abort if the position is won at any point
                    if board.is_winning_move(column) {
                        return Err(anyhow!(
                            "invalid move at position {}: the game is already over",
                            i + 1
                        ));
                    }
                    board.play_column(column);
                }
                _ => {
                    return Err(anyhow!(
                        "invalid move at position {}: could not parse '{}' as a column",
                        i + 1,
                        column_char
                    ))
                }
            }
        }
        Ok(board)
    }

    pub fn player_mask(&self) -> u64 {
        self.player_mask
    }

    pub fn board_mask(&self) -> u64 {
        self.board_mask
    }

    pub fn top_mask(column: usize) -> u64 {
        1 << (column * (HEIGHT + 1) + (HEIGHT - 1))
    }

    pub fn bottom_mask(column: usize) -> u64 {
        1 << (column * (HEIGHT + 1))
    }

    pub fn column_mask(column: usize) -> u64 {
        ((1 << HEIGHT) - 1) << (column * (HEIGHT + 1))
    }

    pub fn non_losing_moves(&self) -> u64 {
        let mut possible_moves = self.possible_moves();
        let opponent_winning_positions = self.opponent_winning_positions();
        let forced_moves = possible_moves & opponent_winning_positions;

        if forced_moves != 0 {
            // if more than one forced move exists, you can't prevent the opponent winning
            if forced_moves & (forced_moves - 1) != 0 {
                return 0;
            } else {
                possible_moves = forced_moves
            }
        }
        // avoid playing below an opponent's winning move
        possible_moves & !(opponent_winning_positions >> 1)
    }

    pub fn possible_moves(&self) -> u64 {
        (self.board_mask + static_masks::bottom_mask()) & static_masks::full_board_mask()
    }

    // open squares that complete alignments for the current player
    fn winning_positions(&self) -> u64 {
        Self::compute_winning_positions(self.player_mask, self.board_mask)
    }

    // open squares that complete alignments for the opponent
    fn opponent_winning_positions(&self) -> u64 {
        Self::compute_winning_positions(self.player_mask ^ self.board_mask, self.board_mask)
    }

    fn compute_winning_positions(player_mask: u64, board_mask: u64) -> u64 {
        // vertical
        // find the top ends of 3-alignemnts
        let mut r = (player_mask << 1) & (player_mask << 2) & (player_mask << 3);

        // horizontal
        let mut p = (player_mask << (HEIGHT + 1)) & (player_mask << (2 * (HEIGHT + 1)));
        // find the right ends of 3-alignments
        r |= p & (player_mask << (3 * (HEIGHT + 1)));
        // find holes of the type ...O O _ O...
        r |= p & (player_mask >> (HEIGHT + 1));

        p = (player_mask >> (HEIGHT + 1)) & (player_mask >> (2 * (HEIGHT + 1)));
        // find the left ends of 3-alignments
        r |= p & (player_mask >> (3 * (HEIGHT + 1)));
        // find holes of the type ...O _ O O...
        r |= p & (player_mask << (HEIGHT + 1));

        // diagonal /
        p = (player_mask << HEIGHT) & (player_mask << (2 * HEIGHT));
        // find the right ends of 3-alignments
        r |= p & (player_mask << (3 * (HEIGHT)));
        // find holes of the type ...O O _ O...
        r |= p & (player_mask >> (HEIGHT));

        p = (player_mask >> (HEIGHT)) & (player_mask >> (2 * HEIGHT));
        // find the left ends of 3-alignments
        r |= p & (player_mask >> (3 * (HEIGHT)));
        // find holes of the type ...O _ O O...
        r |= p & (player_mask << (HEIGHT));

        // diagonal \
        p = (player_mask << (HEIGHT + 2)) & (player_mask << (2 * (HEIGHT + 2)));
        // find the right ends of 3-alignments
        r |= p & (player_mask << (3 * (HEIGHT + 2)));
        // find holes of the type ...O O _ O...
        r |= p & (player_mask >> (HEIGHT + 2));

        p = (player_mask >> (HEIGHT + 2)) & (player_mask >> (2 * (HEIGHT + 2)));
        // find the left ends of 3-alignments
        r |= p & (player_mask >> (3 * (HEIGHT + 2)));
        // find holes of the type ...O _ O O...
        r |= p & (player_mask << (HEIGHT + 2));

        r & (static_masks::full_board_mask() ^ board_mask)
    }

    pub fn move_score(&self, candidate: u64) -> i32 {
        // how many open ends of 3-alignments would the move create?
        Self::compute_winning_positions(self.player_mask | candidate, self.board_mask).count_ones()
            as i32
    }

    pub fn num_moves(&self) -> usize {
        self.num_moves
    }
    pub fn playable(&self, column: usize) -> bool {
        Self::top_mask(column) & self.board_mask == 0
    }
    pub fn play(&mut self, move_bitmap: u64) {
        // switch the current player
        self.player_mask ^= self.board_mask;
        // add a cell of the previous player to the correct column
        self.board_mask |= move_bitmap;
        self.num_moves += 1;
    }
    pub fn play_column(&mut self, column: usize) {
        self.play((self.board_mask + Self::bottom_mask(column)) & Self::column_mask(column));
    }
    pub fn is_winning_move(&self, column: usize) -> bool {
        self.winning_positions() & self.possible_moves() & Self::column_mask(column) != 0
    }
    pub fn can_win_next(&self) -> bool {
        self.winning_positions() & self.possible_moves() != 0
    }

    // key for transposition table
    pub fn key(&self) -> u64 {
        self.player_mask + self.board_mask
    }

    /// Base-3 key for the opening book, canonical across the left-right mirror
    ///
    /// Each column is read bottom-to-top as a run of base-3 digits (1 for the
    /// current player, 2 for the opponent) closed off by a 0 digit. The board
    /// is hashed in both column orders and the smaller value wins, so a
    /// position and its mirror share one book entry.
    ///
    /// The rolling hash only fits in a u64 for positions of at most 33
    /// stones; the opening book caps its depth accordingly and never probes
    /// deeper positions.
    pub fn key3(&self) -> u64 {
        let mut key_forward = 0;
        for column in 0..WIDTH {
            key_forward = self.partial_key3(key_forward, column);
        }

        let mut key_reverse = 0;
        for column in (0..WIDTH).rev() {
            key_reverse = self.partial_key3(key_reverse, column);
        }

        // the trailing separator digit carries no information
        key_forward.min(key_reverse) / 3
    }

    fn partial_key3(&self, mut key: u64, column: usize) -> u64 {
        let mut pos = 1u64 << (column * (HEIGHT + 1));
        while pos & self.board_mask != 0 {
            key *= 3;
            key += if pos & self.player_mask != 0 { 1 } else { 2 };
            pos <<= 1;
        }
        key * 3
    }
}

impl Default for BitBoard {
    fn default() -> Self {
        Self::new()
    }
}
