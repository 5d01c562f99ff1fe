use crate::error::MoveError;
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

/// The owner of a placed tile
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Disc {
    /// The player who moved first
    First,
    /// The player who moved second
    Second,
}

/// A bit-packed Connect 4 position
///
/// Each column takes `HEIGHT + 1` bits, bottom cell first, with one spare bit on
/// top so that column heights can be read off `board_mask + bottom_mask`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
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

    /// Plays a string of one-indexed column digits, returning how many were applied
    ///
    /// Stops at the first character that is not a column, names a full column,
    /// or would win the game. The moves before that point are kept.
    pub fn play_sequence<S: AsRef<str>>(&mut self, moves: S) -> usize {
        for (played, column_char) in moves.as_ref().chars().enumerate() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column @ 1..=WIDTH) => {
                    let column = column - 1;
                    if !self.playable(column) || self.check_winning_move(column) {
                        return played;
                    }
                    self.play_column(column);
                }
                _ => return played,
            }
        }
        moves.as_ref().chars().count()
    }

    /// Builds a position from a move string, failing on the first rejected move
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self, MoveError> {
        let moves = moves.as_ref();
        let mut board = Self::new();

        let played = board.play_sequence(moves);
        match moves.chars().nth(played) {
            None => Ok(board),
            Some(column_char) => {
                let sequence = moves.to_string();
                match column_char.to_digit(10).map(|c| c as usize) {
                    Some(column @ 1..=WIDTH)
                        if board.playable(column - 1) && board.check_winning_move(column - 1) =>
                    {
                        Err(MoveError::GameOver {
                            index: played,
                            sequence,
                        })
                    }
                    _ => Err(MoveError::InvalidMove {
                        index: played,
                        sequence,
                    }),
                }
            }
        }
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

    /// The column a move bitmap lies in, or `WIDTH` for an empty bitmap
    pub fn column_from_move(move_bitmap: u64) -> usize {
        (0..WIDTH)
            .find(|&column| move_bitmap & Self::column_mask(column) != 0)
            .unwrap_or(WIDTH)
    }

    /// Legal moves that don't hand the opponent a win on their next move
    ///
    /// If every legal move loses, all legal moves are returned instead. The
    /// current player's own winning moves are not singled out, check those
    /// with [`check_winning_move`](Self::check_winning_move) first.
    pub fn possible_non_losing_moves(&self) -> u64 {
        match self.non_losing_moves() {
            0 => self.possible_moves(),
            moves => moves,
        }
    }

    // as above, but empty when the position is lost on the opponent's next move
    pub(crate) fn non_losing_moves(&self) -> u64 {
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

    // create a bitmap of open squares that complete alignments for the opponent
    fn opponent_winning_positions(&self) -> u64 {
        let opp_mask = self.player_mask ^ self.board_mask;
        self.winning_positions(opp_mask)
    }

    fn winning_positions(&self, player_mask: u64) -> u64 {
        // vertical
        // find the top ends of 3-alignemnts
        let mut r = (player_mask << 1) & (player_mask << 2) & (player_mask << 3);

        // horizontal, then both diagonals
        for shift in [HEIGHT + 1, HEIGHT, HEIGHT + 2] {
            let mut p = (player_mask << shift) & (player_mask << (2 * shift));
            // find the right ends of 3-alignments
            r |= p & (player_mask << (3 * shift));
            // find holes of the type ...O O _ O...
            r |= p & (player_mask >> shift);

            p = (player_mask >> shift) & (player_mask >> (2 * shift));
            // find the left ends of 3-alignments
            r |= p & (player_mask >> (3 * shift));
            // find holes of the type ...O _ O O...
            r |= p & (player_mask << shift);
        }

        r & (static_masks::full_board_mask() ^ self.board_mask)
    }

    /// Ordering heuristic: open cells completing a four after playing `candidate`
    pub fn move_score(&self, candidate: u64) -> i32 {
        self.winning_positions(self.player_mask | candidate)
            .count_ones() as i32
    }

    pub fn num_moves(&self) -> usize {
        self.num_moves
    }

    pub fn is_full(&self) -> bool {
        self.num_moves == WIDTH * HEIGHT
    }

    pub fn playable(&self, column: usize) -> bool {
        column < WIDTH && Self::top_mask(column) & self.board_mask == 0
    }

    /// Plays a move given as a single bit of [`possible_moves`](Self::possible_moves)
    pub fn play(&mut self, move_bitmap: u64) {
        // switch the current player
        self.player_mask ^= self.board_mask;
        // add a cell of the previous player to the correct column
        self.board_mask |= move_bitmap;
        self.num_moves += 1;
    }

    /// Plays a tile in `column`, which must be playable
    pub fn play_column(&mut self, column: usize) {
        debug_assert!(self.playable(column), "column {} is not playable", column);
        self.play((self.board_mask + Self::bottom_mask(column)) & Self::column_mask(column));
    }

    pub fn check_winning_move(&self, column: usize) -> bool {
        if !self.playable(column) {
            return false;
        }
        let mut pos = self.player_mask;
        // play the move on a copy of the mask, keeping the current player
        pos |= (self.board_mask + Self::bottom_mask(column)) & Self::column_mask(column);

        // horizontal, diagonal /, diagonal \, vertical
        for shift in [HEIGHT + 1, HEIGHT, HEIGHT + 2, 1] {
            // mark all runs of 2
            let m = pos & (pos >> shift);
            // check for runs of 2 * (runs of 2)
            if m & (m >> (2 * shift)) != 0 {
                return true;
            }
        }

        // no alignments
        false
    }

    /// Can the current player win with their next tile?
    pub fn can_win_next(&self) -> bool {
        self.winning_positions(self.player_mask) & self.possible_moves() != 0
    }

    /// Key for the transposition table, shared between a position and its mirror image
    ///
    /// Fits in `WIDTH * (HEIGHT + 1)` bits and is unique for every position up to mirroring.
    pub fn key(&self) -> u64 {
        let key = self.player_mask + self.board_mask;
        key.min(Self::mirror_mask(key))
    }

    /// The same position reflected left to right
    pub fn mirror(&self) -> Self {
        Self {
            player_mask: Self::mirror_mask(self.player_mask),
            board_mask: Self::mirror_mask(self.board_mask),
            num_moves: self.num_moves,
        }
    }

    // swap column `c` with column `WIDTH - 1 - c`
    fn mirror_mask(mask: u64) -> u64 {
        let column_bits = (1 << (HEIGHT + 1)) - 1;
        let mut mirrored = 0;
        for column in 0..WIDTH {
            let bits = (mask >> (column * (HEIGHT + 1))) & column_bits;
            mirrored |= bits << ((WIDTH - 1 - column) * (HEIGHT + 1));
        }
        mirrored
    }

    /// Which player owns the tile at `column`, `row` (row 0 is the bottom)
    pub fn cell(&self, column: usize, row: usize) -> Option<Disc> {
        let tile_mask = Self::bottom_mask(column) << row;
        if self.board_mask & tile_mask == 0 {
            return None;
        }
        // the current player moved first exactly when an even number of moves were made
        let current_is_first = self.num_moves % 2 == 0;
        if (self.player_mask & tile_mask != 0) == current_is_first {
            Some(Disc::First)
        } else {
            Some(Disc::Second)
        }
    }
}

impl Default for BitBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(moves: u64) -> Vec<usize> {
        (0..WIDTH)
            .filter(|&column| moves & BitBoard::column_mask(column) != 0)
            .collect()
    }

    #[test]
    fn play_sequence_counts_applied_moves() {
        let mut board = BitBoard::new();
        assert_eq!(board.play_sequence("4453"), 4);
        assert_eq!(board.num_moves(), 4);

        // '8' is out of range at one-indexed position 3
        let mut board = BitBoard::new();
        assert_eq!(board.play_sequence("448123"), 2);
        assert_eq!(board.num_moves(), 2);

        // the seventh tile in a column does not fit
        let mut board = BitBoard::new();
        assert_eq!(board.play_sequence("1111111"), 6);

        let mut board = BitBoard::new();
        assert_eq!(board.play_sequence("12a3"), 2);
        assert_eq!(board.play_sequence(""), 0);
    }

    #[test]
    fn play_sequence_stops_at_winning_move() {
        let mut board = BitBoard::new();
        assert_eq!(board.play_sequence("1212121"), 6);
        assert!(board.check_winning_move(0));
        assert_eq!(board.num_moves(), 6);
    }

    #[test]
    fn from_moves_reports_errors() {
        assert!(BitBoard::from_moves("4444").is_ok());
        assert_eq!(
            BitBoard::from_moves("440"),
            Err(MoveError::InvalidMove {
                index: 2,
                sequence: "440".to_string()
            })
        );
        assert_eq!(
            BitBoard::from_moves("12121212"),
            Err(MoveError::GameOver {
                index: 6,
                sequence: "12121212".to_string()
            })
        );
    }

    #[test]
    fn winning_moves_in_every_direction() -> Result<(), MoveError> {
        // vertical
        assert!(BitBoard::from_moves("121212")?.check_winning_move(0));
        // horizontal
        assert!(BitBoard::from_moves("112233")?.check_winning_move(3));
        assert!(!BitBoard::from_moves("112233")?.check_winning_move(4));
        // diagonal /
        assert!(BitBoard::from_moves("1223433474")?.check_winning_move(3));
        // diagonal \
        assert!(BitBoard::from_moves("7665455414")?.check_winning_move(3));
        Ok(())
    }

    #[test]
    fn check_winning_move_has_no_side_effects() -> Result<(), MoveError> {
        let board = BitBoard::from_moves("112233")?;
        let before = board;
        for column in 0..WIDTH {
            board.check_winning_move(column);
        }
        assert_eq!(board, before);
        assert_eq!(board.num_moves(), 6);
        assert_eq!(board.possible_moves(), before.possible_moves());
        Ok(())
    }

    #[test]
    fn full_column_is_not_playable() -> Result<(), MoveError> {
        let board = BitBoard::from_moves("444444")?;
        assert!(!board.playable(3));
        assert!(!board.check_winning_move(3));
        assert!(!board.playable(WIDTH));
        assert_eq!(columns(board.possible_moves()), vec![0, 1, 2, 4, 5, 6]);
        Ok(())
    }

    #[test]
    fn non_losing_moves_block_threats() -> Result<(), MoveError> {
        // the first player threatens to complete the bottom row in column 4
        let board = BitBoard::from_moves("11223")?;
        assert_eq!(columns(board.possible_non_losing_moves()), vec![3]);

        // two open ends can't both be blocked: everything legal comes back
        let board = BitBoard::from_moves("33445")?;
        assert_eq!(board.non_losing_moves(), 0);
        assert_eq!(board.possible_non_losing_moves(), board.possible_moves());
        Ok(())
    }

    #[test]
    fn non_losing_moves_avoid_playing_under_a_threat() -> Result<(), MoveError> {
        // second player owns row 1 in columns 5-7, so filling the bottom of column 4 loses
        let board = BitBoard::from_moves("77661525")?;
        let moves = board.possible_non_losing_moves();
        assert_eq!(columns(moves), vec![0, 1, 2, 4, 5, 6]);
        assert_eq!(moves & !board.possible_moves(), 0);
        Ok(())
    }

    #[test]
    fn key_is_shared_with_mirror() -> Result<(), MoveError> {
        let board = BitBoard::from_moves("1123")?;
        let mirror = BitBoard::from_moves("7765")?;
        assert_eq!(board.mirror(), mirror);
        assert_eq!(board.key(), mirror.key());
        assert_ne!(board.key(), BitBoard::from_moves("1132")?.key());
        assert!(board.key() < 1 << (WIDTH * (HEIGHT + 1)));
        Ok(())
    }

    #[test]
    fn cells_follow_move_order() -> Result<(), MoveError> {
        let board = BitBoard::from_moves("445")?;
        assert_eq!(board.cell(3, 0), Some(Disc::First));
        assert_eq!(board.cell(3, 1), Some(Disc::Second));
        assert_eq!(board.cell(4, 0), Some(Disc::First));
        assert_eq!(board.cell(4, 1), None);
        assert_eq!(board.cell(0, 0), None);
        Ok(())
    }

    #[test]
    fn column_from_move_finds_the_column() -> Result<(), MoveError> {
        let board = BitBoard::from_moves("4453")?;
        let mut found = vec![];
        let mut moves = board.possible_moves();
        while moves != 0 {
            let next = moves & moves.wrapping_neg();
            found.push(BitBoard::column_from_move(next));
            moves ^= next;
        }
        assert_eq!(found, (0..WIDTH).collect::<Vec<_>>());
        assert_eq!(BitBoard::column_from_move(BitBoard::top_mask(6)), 6);
        assert_eq!(BitBoard::column_from_move(0), WIDTH);
        Ok(())
    }

    #[test]
    fn can_win_next_matches_columns() -> Result<(), MoveError> {
        let board = BitBoard::from_moves("112233")?;
        assert!(board.can_win_next());
        assert!(!BitBoard::new().can_win_next());
        Ok(())
    }
}
