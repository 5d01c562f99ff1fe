//! An agent to solve the game of Connect 4

use crate::{
    bitboard::*, move_sorter::*, opening_book::OpeningBook, transposition_table::*, HEIGHT, WIDTH,
};

use log::{debug, trace};
use std::cmp::Ordering;

/// The minimum possible score of a position
pub const MIN_SCORE: i32 = -((WIDTH * HEIGHT) as i32) / 2 + 3;
/// The maximum possible score of a postion
pub const MAX_SCORE: i32 = ((WIDTH * HEIGHT) as i32 + 1) / 2 - 3;

/// An agent to solve Connect 4 positions
///
/// # Notes
/// This agent uses a classical game tree search (negamax with alpha-beta pruning)
/// driven by a null-window bisection of the score range, with move ordering and a
/// transposition table to find the mathematically exact score of any position
///
/// # Position Scoring
/// Scores are given from the point of view of the player to move. A positive score
/// means they can force a win, a negative score means their opponent can, and 0 is a
/// draw. Winning with your last possible tile (your 21st on a 7x6 board) scores 1,
/// and each earlier tile adds 1, up to 18 for a win with your 4th tile. Losses
/// mirror this with negative values.
///
/// In weak mode only the sign is computed, giving -1, 0 or 1.
pub struct Solver {
    node_count: usize,
    transposition_table: TranspositionTable,
    opening_book: Option<Box<dyn OpeningBook>>,
}

impl Solver {
    /// Creates a new `Solver` with an empty transposition table
    pub fn new() -> Self {
        Self {
            node_count: 0,
            transposition_table: TranspositionTable::new(),
            opening_book: None,
        }
    }

    /// Adds an opening book to an existing `Solver`
    pub fn with_opening_book<B: OpeningBook + 'static>(mut self, opening_book: B) -> Self {
        self.opening_book = Some(Box::new(opening_book));
        self
    }

    /// The number of nodes searched since the last [`reset`](Self::reset) (for diagnostics only)
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Resets the node counter, keeping the transposition table for reuse
    pub fn reset(&mut self) {
        self.node_count = 0;
    }

    /// Forgets every stored search result
    pub fn clear_transposition_table(&mut self) {
        self.transposition_table.clear();
    }

    /// Performs game tree search
    ///
    /// Assumes the current player can't win with their next move.
    ///
    /// Returns the score of the position (see [Position Scoring]) if it lies
    /// inside `(alpha, beta)`, otherwise a bound on the score on the same side
    /// of the window as the true score.
    ///
    /// [Position Scoring]: #position-scoring
    fn negamax(&mut self, board: &BitBoard, mut alpha: i32, mut beta: i32) -> i32 {
        self.node_count += 1;

        // look for moves that don't give the opponent a next turn win
        let non_losing_moves = board.non_losing_moves();
        if non_losing_moves == 0 {
            return -((WIDTH * HEIGHT) as i32 - board.num_moves() as i32) / 2;
        }

        // check for draw, neither player can win with the last two tiles
        if board.num_moves() >= WIDTH * HEIGHT - 2 {
            return 0;
        }

        // lower bound of score, the opponent can't win with their next move
        let min = -((WIDTH * HEIGHT) as i32 - 2 - board.num_moves() as i32) / 2;
        if alpha < min {
            alpha = min;
            if alpha >= beta {
                return alpha;
            }
        }

        // upper bound of score, we can't win with our next move
        let max = ((WIDTH * HEIGHT) as i32 - 1 - board.num_moves() as i32) / 2;
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

        if let Some(book) = &self.opening_book {
            if let Some(score) = book.lookup(key) {
                return score;
            }
        }

        let mut moves = MoveSorter::new();
        // reversing move order to put edges first reduces the amount of sorting
        // as these moves are worse on average
        for i in (0..WIDTH).rev() {
            let column = move_order()[i];
            let candidate = non_losing_moves & BitBoard::column_mask(column);
            if candidate != 0 {
                moves.push(candidate, board.move_score(candidate))
            }
        }

        // search the next level of the tree
        for move_bitmap in moves {
            let mut next = *board;
            next.play(move_bitmap);
            // the search window is flipped for the other player
            let score = -self.negamax(&next, -beta, -alpha);
            // if a child node's score is better than beta, we can prune the tree
            // here because a perfect opponent will not pick this branch
            if score >= beta {
                // save a lower bound of the score
                self.transposition_table
                    .set(key, (score + MAX_SCORE - 2 * MIN_SCORE + 2) as u8);
                return score;
            }
            if score > alpha {
                alpha = score;
            }
        }

        // save an upper bound of the score,
        // offset of one to prevent putting a 0, which represents an empty entry
        self.transposition_table
            .set(key, (alpha - MIN_SCORE + 1) as u8);
        alpha
    }

    /// Calculates the score of a position (see [Position Scoring])
    ///
    /// With `weak` set only the outcome is computed: 1 for a win, 0 for a draw
    /// and -1 for a loss. The previous move must not have ended the game.
    ///
    /// [Position Scoring]: #position-scoring
    pub fn solve(&mut self, board: &BitBoard, weak: bool) -> i32 {
        // check for win for current player on this move
        if board.can_win_next() {
            let score = ((WIDTH * HEIGHT + 1 - board.num_moves()) / 2) as i32;
            return if weak { 1 } else { score };
        }
        if board.is_full() {
            return 0;
        }

        let (mut min, mut max) = if weak {
            (-1, 1)
        } else {
            (
                -((WIDTH * HEIGHT) as i32 - board.num_moves() as i32) / 2,
                ((WIDTH * HEIGHT + 1 - board.num_moves()) / 2) as i32,
            )
        };

        // iteratively narrow the search window
        while min < max {
            let mut mid = min + (max - min) / 2;
            // tweak the search value for both negative and positive searches
            if mid <= 0 && min / 2 < mid {
                mid = min / 2
            } else if mid >= 0 && max / 2 > mid {
                mid = max / 2
            }
            trace!("probing score {} in [{}, {}]", mid, min, max);

            // use a null-window to determine if the actual score is greater or less that mid
            let r = self.negamax(board, mid, mid + 1);

            // r is not necessarily the exact true score, but its value indicates
            // whether the true score is above or below the search target
            if r <= mid {
                // actual score <= mid
                max = r
            } else {
                // actual score > mid
                min = r;
            }
        }
        debug!(
            "solved position after {} moves: score {}, {} nodes",
            board.num_moves(),
            min,
            self.node_count
        );

        // min and max should be equal here
        if weak {
            min.signum()
        } else {
            min
        }
    }

    /// Converts a position score to a win distance in a single player's moves
    pub fn score_to_win_distance(board: &BitBoard, score: i32) -> usize {
        match score.cmp(&0) {
            Ordering::Equal => WIDTH * HEIGHT - board.num_moves(),
            Ordering::Greater => {
                (WIDTH * HEIGHT / 2 + 1 - score as usize) - board.num_moves() / 2
            }
            Ordering::Less => {
                (WIDTH * HEIGHT / 2 + 1) - (-score as usize) - board.num_moves() / 2
            }
        }
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opening_book::MemoryBook;
    use anyhow::Result;

    #[test]
    fn immediate_win() -> Result<()> {
        let board = BitBoard::from_moves("112233")?;
        let mut solver = Solver::new();
        assert_eq!(solver.solve(&board, false), 18);
        assert_eq!(solver.solve(&board, true), 1);
        // no search needed
        assert_eq!(solver.node_count(), 0);
        Ok(())
    }

    #[test]
    fn double_threat_wins_with_fourth_tile() -> Result<()> {
        let mut solver = Solver::new();
        assert_eq!(solver.solve(&BitBoard::from_moves("3344")?, false), 18);
        assert_eq!(solver.solve(&BitBoard::from_moves("5544")?, false), 18);
        assert_eq!(solver.solve(&BitBoard::from_moves("3344")?, true), 1);
        Ok(())
    }

    #[test]
    fn unstoppable_threats_lose() -> Result<()> {
        let mut solver = Solver::new();
        let board = BitBoard::from_moves("33445")?;
        assert_eq!(solver.solve(&board, false), -18);
        assert_eq!(solver.solve(&board, true), -1);
        Ok(())
    }

    #[test]
    fn reset_keeps_results() -> Result<()> {
        let board = BitBoard::from_moves("4455")?;
        let mut solver = Solver::new();
        let first = solver.solve(&board, false);
        let first_nodes = solver.node_count();
        assert!(first_nodes > 0);

        solver.reset();
        assert_eq!(solver.node_count(), 0);
        assert_eq!(solver.solve(&board, false), first);

        solver.clear_transposition_table();
        solver.reset();
        assert_eq!(solver.solve(&board, false), first);
        assert_eq!(solver.node_count(), first_nodes);
        Ok(())
    }

    #[test]
    fn opening_book_short_circuits_search() -> Result<()> {
        let board = BitBoard::from_moves("4455")?;
        let score = Solver::new().solve(&board, false);

        let book = MemoryBook::from_scores(vec![(board, score)]);
        let mut solver = Solver::new().with_opening_book(book);
        assert_eq!(solver.solve(&board, false), score);
        assert!(solver.node_count() <= 20);
        Ok(())
    }

    #[test]
    fn win_distance() -> Result<()> {
        let board = BitBoard::from_moves("112233")?;
        assert_eq!(Solver::score_to_win_distance(&board, 18), 1);
        assert_eq!(Solver::score_to_win_distance(&BitBoard::new(), 1), 21);
        assert_eq!(Solver::score_to_win_distance(&BitBoard::new(), 0), 42);
        Ok(())
    }
}
