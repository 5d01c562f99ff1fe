//! Text rendering of a board for the terminal

use anyhow::Result;
use crossterm::{
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::io::Write;

use crate::{
    bitboard::{BitBoard, Disc},
    HEIGHT, WIDTH,
};

fn symbol(cell: Option<Disc>) -> char {
    match cell {
        Some(Disc::First) => 'X',
        Some(Disc::Second) => 'O',
        None => '.',
    }
}

/// Writes `board` as a grid of `X` (first player), `O` (second player) and `.`,
/// top row first, under a header of column numbers
///
/// With `colour` set the tiles are styled with terminal escape codes.
pub fn render_board<W: Write>(out: &mut W, board: &BitBoard, colour: bool) -> Result<()> {
    let cols: String = (1..=WIDTH).map(|x| x.to_string()).collect();
    writeln!(out, "{}", cols)?;

    for row in (0..HEIGHT).rev() {
        for column in 0..WIDTH {
            let cell = board.cell(column, row);
            if colour {
                out.queue(PrintStyledContent(
                    style(symbol(cell))
                        .attribute(Attribute::Bold)
                        .with(match cell {
                            Some(Disc::First) => Color::Red,
                            Some(Disc::Second) => Color::Yellow,
                            None => Color::DarkBlue,
                        }),
                ))?;
            } else {
                write!(out, "{}", symbol(cell))?;
            }
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
