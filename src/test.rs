#[cfg(test)]
pub mod test {
    use anyhow::Result;

    use crate::bitboard::BitBoard;
    use crate::engine::Engine;
    use crate::opening_book::{OpeningBook, MAX_BOOK_DEPTH};
    use crate::solver::{move_order, MoveSorter, Solver, INVALID_MOVE};
    use crate::transposition_table::{next_prime, TranspositionTable};
    use crate::{HEIGHT, WIDTH};

    fn mirror(sequence: &str) -> String {
        sequence
            .chars()
            .map(|c| {
                let column = c.to_digit(10).unwrap() as usize;
                std::char::from_digit((WIDTH - 1 - column) as u32, 10).unwrap()
            })
            .collect()
    }

    #[test]
    pub fn position_invariants() -> Result<()> {
        let board = BitBoard::from_moves("000000334455")?;

        assert_eq!(board.num_moves(), 12);
        assert_eq!(board.board_mask().count_ones() as usize, board.num_moves());
        // the current player's tiles are a subset of all tiles
        assert_eq!(board.player_mask() & !board.board_mask(), 0);

        // gravity: every column is a contiguous run of tiles from the bottom
        for column in 0..WIDTH {
            let column_bits = (board.board_mask() >> (column * (HEIGHT + 1))) & ((1 << HEIGHT) - 1);
            assert_eq!(column_bits & (column_bits + 1), 0);
        }
        Ok(())
    }

    #[test]
    pub fn replay_rejects_bad_input() {
        // column out of range
        let err = BitBoard::from_moves("07").unwrap_err();
        assert!(err.to_string().contains("position 2"));

        // not a digit
        assert!(BitBoard::from_moves("x").is_err());

        // column full after six tiles
        let err = BitBoard::from_moves("0000000").unwrap_err();
        assert!(err.to_string().contains("position 7"));

        // the seventh move completes a vertical four-in-a-row
        let err = BitBoard::from_moves("0101010").unwrap_err();
        assert!(err.to_string().contains("position 7"));
    }

    #[test]
    pub fn key3_single_tile() -> Result<()> {
        // one tile in the centre column: trits 0 0 0 (0 2) 0 0 0, divided by 3
        let board = BitBoard::from_moves("3")?;
        assert_eq!(board.key3(), 54);
        Ok(())
    }

    #[test]
    pub fn key3_mirror_symmetry() -> Result<()> {
        for sequence in &["0123456", "334455", "0112522333", "000000334455"] {
            let board = BitBoard::from_moves(sequence)?;
            let mirrored = BitBoard::from_moves(mirror(sequence))?;
            assert_eq!(board.key3(), mirrored.key3(), "sequence {}", sequence);
        }
        Ok(())
    }

    #[test]
    pub fn transposition_table_round_trip() {
        let mut table = TranspositionTable::new();
        let size = table.size() as u64;

        table.put(42, 7);
        assert_eq!(table.get(42), 7);

        // a same-slot key must read as absent, not as the resident value
        assert_eq!(table.get(42 + size), 0);

        // overwriting the slot evicts the old key
        table.put(42 + size, 9);
        assert_eq!(table.get(42 + size), 9);
        assert_eq!(table.get(42), 0);

        table.reset();
        assert_eq!(table.get(42 + size), 0);
    }

    #[test]
    pub fn table_sizes_are_prime() {
        assert_eq!(next_prime(1), 2);
        assert_eq!(next_prime(8), 11);
        assert_eq!(next_prime(16), 17);
        assert_eq!(next_prime(17), 17);
        assert_eq!(next_prime(1 << 23), (1 << 23) + 9);
    }

    #[test]
    pub fn win_detection_all_directions() -> Result<()> {
        // vertical: three tiles stacked in column 0
        let board = BitBoard::from_moves("010101")?;
        assert!(board.is_winning_move(0));
        assert!(board.can_win_next());

        // horizontal: three tiles along the bottom row
        let board = BitBoard::from_moves("001122")?;
        assert!(board.is_winning_move(3));
        assert!(!board.is_winning_move(4));

        // diagonal /: tiles on (0,0) (1,1) (2,2), completed at (3,3)
        let board = BitBoard::from_moves("0112522333")?;
        assert!(board.is_winning_move(3));

        // diagonal \: the mirrored sequence completes the other diagonal
        let board = BitBoard::from_moves(mirror("0112522333"))?;
        assert!(board.is_winning_move(3));
        Ok(())
    }

    #[test]
    pub fn move_ordering() {
        assert_eq!(move_order(), [3, 4, 2, 5, 1, 6, 0]);

        let mut sorter = MoveSorter::new();
        sorter.push(1, 0);
        sorter.push(2, 3);
        sorter.push(4, 1);
        // extraction is best-first
        assert_eq!(sorter.collect::<Vec<u64>>(), vec![2, 4, 1]);
    }

    #[test]
    pub fn forced_win_and_loss_scores() -> Result<()> {
        let mut solver = Solver::new();

        // the current player completes the bottom row immediately
        let board = BitBoard::from_moves("001122")?;
        assert_eq!(solver.solve(board, false), 18);

        // the current player faces an unstoppable double threat
        let board = BitBoard::from_moves("33445")?;
        assert_eq!(solver.solve(board, false), -18);
        assert!(solver.node_count > 0);

        // weak solving only classifies the result
        assert_eq!(solver.solve(board, true), -1);
        Ok(())
    }

    #[test]
    pub fn analyze_single_winning_column() -> Result<()> {
        // the current player has a vertical win in column 0; every other
        // column leaves the opponent's bottom-row double threat standing
        let board = BitBoard::from_moves("030405")?;
        let mut solver = Solver::new();
        let scores = solver.analyze(&board, false);

        assert_eq!(scores, [18, -18, -18, -18, -18, -18, -18]);
        Ok(())
    }

    #[test]
    pub fn analyze_flags_unplayable_columns() -> Result<()> {
        // column 0 is full; columns 2 and 6 both complete the bottom row
        let board = BitBoard::from_moves("000000334455")?;
        let mut solver = Solver::new();
        let scores = solver.analyze(&board, false);

        assert_eq!(scores, [INVALID_MOVE, 14, 15, 14, 14, 14, 15]);
        Ok(())
    }

    fn book_header(
        width: u8,
        height: u8,
        depth: i8,
        key_bytes: u8,
        value_bytes: u8,
        log_size: u8,
    ) -> Vec<u8> {
        vec![width, height, depth as u8, key_bytes, value_bytes, log_size]
    }

    #[test]
    pub fn opening_book_rejects_bad_headers() {
        let payload = vec![0u8; 64];

        for (header, field) in &[
            (book_header(8, 6, 12, 4, 1, 3), "width"),
            (book_header(7, 7, 12, 4, 1, 3), "height"),
            (book_header(7, 6, 43, 4, 1, 3), "depth"),
            // the base-3 key of a 34-stone position no longer fits in a u64
            (book_header(7, 6, 34, 4, 1, 3), "depth"),
            (book_header(7, 6, 12, 9, 1, 3), "key size"),
            (book_header(7, 6, 12, 4, 2, 3), "value size"),
            (book_header(7, 6, 12, 4, 1, 41), "log2"),
        ] {
            let mut buffer = header.clone();
            buffer.extend_from_slice(&payload);
            let err = OpeningBook::load(&buffer).unwrap_err();
            assert!(err.to_string().contains(field), "field {}", field);
        }

        // header alone is not a book
        let err = OpeningBook::load(&book_header(7, 6, 12, 4, 1, 3)).unwrap_err();
        assert!(err.to_string().contains("too short"));

        // the deepest supported book loads
        let mut buffer = book_header(7, 6, MAX_BOOK_DEPTH as i8, 4, 1, 3);
        buffer.extend_from_slice(&payload);
        assert!(OpeningBook::load(&buffer).is_ok());
    }

    #[test]
    pub fn opening_book_lookup() -> Result<()> {
        let board = BitBoard::from_moves("33")?;
        let key = board.key3();

        // depth 2, 4-byte keys, log2(size) = 3 so the table has 11 slots
        let size = 11;
        let key_bytes = 4;
        let mut buffer = book_header(7, 6, 2, key_bytes as u8, 1, 3);
        buffer.extend_from_slice(&vec![0; size * key_bytes]);
        buffer.extend_from_slice(&vec![0; size]);

        let slot = (key % size as u64) as usize;
        let keys_offset = 6 + slot * key_bytes;
        buffer[keys_offset..keys_offset + key_bytes]
            .copy_from_slice(&key.to_le_bytes()[..key_bytes]);
        buffer[6 + size * key_bytes + slot] = 37;

        let book = OpeningBook::load(&buffer)?;
        assert_eq!(book.depth(), 2);
        assert_eq!(book.get(&board), 37);

        // a different position misses via the truncated key comparison
        assert_eq!(book.get(&BitBoard::from_moves("34")?), 0);

        // positions deeper than the book are never consulted
        assert_eq!(book.get(&BitBoard::from_moves("334")?), 0);
        Ok(())
    }

    #[test]
    pub fn engine_best_move() -> Result<()> {
        let mut engine = Engine::new();

        // two equally good winning columns: the tie-break picks either
        let best = engine.best_move("000000334455")?;
        assert!(best == 2 || best == 6);

        // a single winning column is always chosen
        assert_eq!(engine.best_move("030405")?, 0);

        // illegal sequences surface the offending move index
        assert!(engine.best_move("0000000").is_err());
        Ok(())
    }

    #[test]
    pub fn engine_degrades_without_valid_book() -> Result<()> {
        // a garbage buffer is logged and ignored, search still works
        let mut engine = Engine::with_opening_book(&[1, 2, 3]);
        let best = engine.best_move("000000334455")?;
        assert!(best == 2 || best == 6);
        Ok(())
    }

    // Takes a very long time without an opening book; the known exact value of
    // 7x6 Connect 4 is a first-player win with their final tile
    #[test]
    #[ignore]
    pub fn full_search() {
        let mut solver = Solver::new();
        assert_eq!(solver.solve(BitBoard::new(), false), 1);
        assert_eq!(solver.solve(BitBoard::new(), true), 1);
    }
}
