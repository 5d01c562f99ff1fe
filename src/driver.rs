//! Move selection for a computer opponent

use log::debug;
use rand::Rng;
use std::time::{Duration, Instant};

use crate::{bitboard::BitBoard, solver::Solver, WIDTH};

/// What the driver found out about one candidate column
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ColumnOutcome {
    /// Playing here wins immediately
    Winning,
    /// The column was solved; `score` is from the point of view of the player choosing
    Scored {
        score: i32,
        nodes: usize,
        elapsed: Duration,
    },
    /// The column is full or hands the opponent an immediate win
    NotPossible,
}

/// A single column evaluation, columns are zero-indexed
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub column: usize,
    pub outcome: ColumnOutcome,
}

/// The move picked for a turn
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Decision {
    /// This column wins the game right away
    Win(usize),
    /// Play this column
    Play(usize),
    /// There is nothing to play
    NoMove,
}

/// The result of [`Driver::play_turn`]
#[derive(Clone, Debug, PartialEq)]
pub struct Turn {
    /// Evaluations in the order they were made, highest column first
    pub evaluations: Vec<Evaluation>,
    pub decision: Decision,
}

/// Picks moves by solving every reply and choosing at random among the best ones
pub struct Driver<R: Rng> {
    solver: Solver,
    rng: R,
    weak: bool,
}

impl<R: Rng> Driver<R> {
    pub fn new(solver: Solver, rng: R, weak: bool) -> Self {
        Self { solver, rng, weak }
    }

    /// Whether replies are only solved to win, draw or loss
    pub fn is_weak(&self) -> bool {
        self.weak
    }

    /// Evaluates every column of `board` and decides on a move for the player to move
    pub fn play_turn(&mut self, board: &BitBoard) -> Turn {
        let possible = board.possible_non_losing_moves();
        let mut evaluations = Vec::with_capacity(WIDTH);

        let mut best_score = i32::MIN;
        let mut best_columns = Vec::with_capacity(WIDTH);

        for column in (0..WIDTH).rev() {
            if board.check_winning_move(column) {
                evaluations.push(Evaluation {
                    column,
                    outcome: ColumnOutcome::Winning,
                });
                debug!("column {} wins immediately", column + 1);
                return Turn {
                    evaluations,
                    decision: Decision::Win(column),
                };
            }

            if possible & BitBoard::column_mask(column) == 0 {
                evaluations.push(Evaluation {
                    column,
                    outcome: ColumnOutcome::NotPossible,
                });
                continue;
            }

            self.solver.reset();
            let mut next = *board;
            next.play_column(column);

            let start_time = Instant::now();
            // the reply is scored from the opponent's side
            let score = -self.solver.solve(&next, self.weak);
            let elapsed = start_time.elapsed();

            evaluations.push(Evaluation {
                column,
                outcome: ColumnOutcome::Scored {
                    score,
                    nodes: self.solver.node_count(),
                    elapsed,
                },
            });

            if score > best_score {
                best_score = score;
                best_columns.clear();
                best_columns.push(column);
            } else if score == best_score {
                best_columns.push(column);
            }
        }

        let decision = if best_columns.is_empty() {
            Decision::NoMove
        } else {
            Decision::Play(best_columns[self.rng.random_range(0..best_columns.len())])
        };
        debug!(
            "best score {} for columns {:?}, decided {:?}",
            best_score, best_columns, decision
        );

        Turn {
            evaluations,
            decision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn driver(seed: u64) -> Driver<Xoshiro256PlusPlus> {
        Driver::new(Solver::new(), Xoshiro256PlusPlus::seed_from_u64(seed), false)
    }

    fn scores(turn: &Turn) -> Vec<(usize, i32)> {
        turn.evaluations
            .iter()
            .filter_map(|e| match e.outcome {
                ColumnOutcome::Scored { score, .. } => Some((e.column, score)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn takes_immediate_win() -> Result<()> {
        let board = BitBoard::from_moves("7426232637326752644614111")?;
        let turn = driver(0).play_turn(&board);
        assert_eq!(turn.decision, Decision::Win(4));
        // columns 7 and 6 are solved before the winning one is reached
        assert_eq!(scores(&turn), vec![(6, 8), (5, -7)]);
        assert_eq!(turn.evaluations.len(), 3);
        assert_eq!(turn.evaluations[2].outcome, ColumnOutcome::Winning);
        Ok(())
    }

    #[test]
    fn blocks_a_threat() -> Result<()> {
        let board = BitBoard::from_moves("171375167363476162452132271")?;
        let turn = driver(0).play_turn(&board);
        assert_eq!(turn.decision, Decision::Play(5));
        assert_eq!(scores(&turn), vec![(5, -6)]);
        assert_eq!(turn.evaluations.len(), WIDTH);
        Ok(())
    }

    #[test]
    fn chooses_among_best_columns() -> Result<()> {
        let board = BitBoard::from_moves("1666425755643557763612254722")?;
        let turn = driver(7).play_turn(&board);

        let columns: Vec<usize> = turn.evaluations.iter().map(|e| e.column).collect();
        assert_eq!(columns, (0..WIDTH).rev().collect::<Vec<_>>());
        assert_eq!(scores(&turn), vec![(6, 3), (2, 6), (1, 3), (0, 6)]);
        match turn.decision {
            Decision::Play(column) => assert!(column == 2 || column == 0),
            decision => panic!("unexpected decision {:?}", decision),
        }
        Ok(())
    }

    #[test]
    fn lost_position_still_plays() -> Result<()> {
        // every reply allows an immediate win, so every legal column is solved
        let board = BitBoard::from_moves("531372736215144427275631")?;
        let turn = driver(1).play_turn(&board);
        assert_eq!(scores(&turn).len(), WIDTH);
        assert!(scores(&turn).iter().all(|&(_, score)| score == -9));
        assert!(matches!(turn.decision, Decision::Play(_)));
        Ok(())
    }

    #[test]
    fn weak_scores_are_signs() -> Result<()> {
        let board = BitBoard::from_moves("1666425755643557763612254722")?;
        let mut driver = Driver::new(Solver::new(), Xoshiro256PlusPlus::seed_from_u64(3), true);
        let turn = driver.play_turn(&board);
        assert_eq!(scores(&turn), vec![(6, 1), (2, 1), (1, 1), (0, 1)]);
        Ok(())
    }

    #[test]
    fn fixed_seed_is_reproducible() -> Result<()> {
        let board = BitBoard::from_moves("531372736215144427275631")?;
        let mut decisions = Vec::new();
        for seed in 0..8 {
            let first = driver(seed).play_turn(&board).decision;
            let second = driver(seed).play_turn(&board).decision;
            assert_eq!(first, second);
            decisions.push(first);
        }
        // ties really are broken at random
        assert!(decisions.iter().any(|&d| d != decisions[0]));
        Ok(())
    }

    #[test]
    fn full_board_has_no_move() -> Result<()> {
        let board = BitBoard::from_moves("257771314744647214154617633623313656555222")?;
        assert!(board.is_full());

        let turn = driver(0).play_turn(&board);
        assert_eq!(turn.decision, Decision::NoMove);
        assert!(turn
            .evaluations
            .iter()
            .all(|e| e.outcome == ColumnOutcome::NotPossible));
        Ok(())
    }
}
