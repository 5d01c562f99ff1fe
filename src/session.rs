//! Line based play against the computer
//!
//! Every input line extends the moves played so far. The user's moves are
//! checked, then the computer solves each reply, reports its findings and
//! answers with one of the best columns.

use anyhow::Result;
use log::info;
use rand::Rng;

use std::io::Write;

use crate::{
    bitboard::BitBoard,
    error::MoveError,
    driver::{ColumnOutcome, Decision, Driver},
    render::render_board,
    solver::Solver,
};

/// Where the game stands after a line has been processed
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    /// Waiting for the user's next moves
    Continue,
    /// The line was rejected and nothing changed
    Rejected,
    UserWon,
    ComputerWon,
    Draw,
}

impl Status {
    pub fn is_finished(&self) -> bool {
        matches!(self, Status::UserWon | Status::ComputerWon | Status::Draw)
    }
}

/// One game against the computer
pub struct Session<R: Rng> {
    driver: Driver<R>,
    // all accepted moves, user and computer
    moves: String,
    colour: bool,
}

impl<R: Rng> Session<R> {
    pub fn new(driver: Driver<R>, colour: bool) -> Self {
        Self {
            driver,
            moves: String::new(),
            colour,
        }
    }

    /// The moves accepted so far
    pub fn moves(&self) -> &str {
        &self.moves
    }

    /// Handles one line of user moves, writing the protocol output to `out`
    pub fn process_line<W: Write>(&mut self, input: &str, out: &mut W) -> Result<Status> {
        let candidate = format!("{}{}", self.moves, input.trim());
        writeln!(out, "User Playing {}", candidate)?;

        let mut board = match BitBoard::from_moves(&candidate) {
            Ok(board) => board,
            Err(MoveError::GameOver { .. }) => {
                writeln!(out, "Winning move!")?;
                writeln!(out, "User wins!")?;
                return Ok(Status::UserWon);
            }
            Err(err @ MoveError::InvalidMove { .. }) => {
                writeln!(out, "User Invalid move {} \"{}\"", err.index() + 1, candidate)?;
                // show what the valid part of the line would have led to
                let mut prefix = BitBoard::new();
                prefix.play_sequence(&candidate);
                render_board(out, &prefix, self.colour)?;
                return Ok(Status::Rejected);
            }
        };
        self.moves = candidate;

        let turn = self.driver.play_turn(&board);
        for evaluation in &turn.evaluations {
            let column = evaluation.column + 1;
            match evaluation.outcome {
                ColumnOutcome::Winning => writeln!(out, "{}.{}, s: Winning", self.moves, column)?,
                ColumnOutcome::Scored { score, elapsed, .. } => writeln!(
                    out,
                    "{}.{}, s: {}, t: {}",
                    self.moves,
                    column,
                    score,
                    elapsed.as_micros()
                )?,
                ColumnOutcome::NotPossible => {
                    writeln!(out, "{}.{}, s: not possible", self.moves, column)?
                }
            }
        }

        match turn.decision {
            Decision::NoMove => {
                if board.is_full() {
                    writeln!(out, "Draw!")?;
                    Ok(Status::Draw)
                } else {
                    writeln!(out, "User wins!")?;
                    Ok(Status::UserWon)
                }
            }
            Decision::Win(column) => {
                writeln!(out, "Computer Playing {}", column + 1)?;
                writeln!(out, "Winning move!")?;
                writeln!(out, "Computer wins!")?;
                Ok(Status::ComputerWon)
            }
            Decision::Play(column) => {
                writeln!(out, "Computer Playing {}", column + 1)?;
                board.play_column(column);
                self.moves.push_str(&(column + 1).to_string());
                render_board(out, &board, self.colour)?;

                if board.is_full() {
                    writeln!(out, "Draw!")?;
                    return Ok(Status::Draw);
                }

                let score = match turn.evaluations.iter().find(|e| e.column == column) {
                    Some(evaluation) => match evaluation.outcome {
                        ColumnOutcome::Scored { score, .. } => Some(score),
                        _ => None,
                    },
                    None => None,
                };
                // weak scores carry no distance
                if let (Some(score), false) = (score, self.driver.is_weak()) {
                    info!(
                        "computer score {} after {}, at most {} moves to the end",
                        score,
                        self.moves,
                        Solver::score_to_win_distance(&board, -score)
                    );
                }
                Ok(Status::Continue)
            }
        }
    }
}
