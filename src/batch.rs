//! Scores positions read one per line
//!
//! Each valid line produces `<moves> <score> <nodes> <microseconds>`. An
//! invalid line, or one whose game is already won, gives an empty output line
//! and a warning in the log. Blank lines are echoed as blank lines.

use anyhow::Result;
use log::warn;

use std::io::{BufRead, Write};
use std::time::Instant;

use crate::{bitboard::BitBoard, solver::Solver};

/// Solves every position in `input`, writing one line per position to `out`
///
/// Returns the number of positions solved.
pub fn evaluate<R: BufRead, W: Write>(
    input: R,
    out: &mut W,
    solver: &mut Solver,
    weak: bool,
) -> Result<usize> {
    let mut solved = 0;
    for (line_number, line) in input.lines().enumerate() {
        let line = line?;
        let moves = line.trim();
        if moves.is_empty() {
            writeln!(out)?;
            continue;
        }

        match BitBoard::from_moves(moves) {
            Err(err) => {
                warn!("line {}: {}", line_number + 1, err);
                writeln!(out)?;
            }
            Ok(board) => {
                solver.reset();
                let start_time = Instant::now();
                let score = solver.solve(&board, weak);
                let elapsed = start_time.elapsed();
                writeln!(
                    out,
                    "{} {} {} {}",
                    moves,
                    score,
                    solver.node_count(),
                    elapsed.as_micros()
                )?;
                solved += 1;
            }
        }
    }
    Ok(solved)
}
