/// Errors produced when replaying a move sequence onto an empty board.
///
/// `index` is the zero-based position of the rejected character, so the
/// prefix `sequence[..index]` is always a valid game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("invalid move {} in \"{sequence}\"", .index + 1)]
    InvalidMove { index: usize, sequence: String },

    #[error("move {} in \"{sequence}\" wins the game", .index + 1)]
    GameOver { index: usize, sequence: String },
}

impl MoveError {
    /// Zero-based index of the rejected move
    pub fn index(&self) -> usize {
        match self {
            MoveError::InvalidMove { index, .. } | MoveError::GameOver { index, .. } => *index,
        }
    }
}
