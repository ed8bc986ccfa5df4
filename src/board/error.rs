use thiserror::Error;

/// Errors raised by the board engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Invalid board dimensions: {width}x{height} (need width >= 2 and height >= 1)")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Position ({col},{row}) is outside the {width}x{height} board")]
    OutOfBounds {
        col: u8,
        row: u8,
        width: u8,
        height: u8,
    },

    /// A move failed validation; the board was left untouched
    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("Board sync carried {actual} tokens, expected {expected}")]
    TokenCount { expected: usize, actual: usize },

    #[error("Invalid side: {0}")]
    InvalidSide(String),

    #[error("Invalid board layout: {0}")]
    InvalidLayout(String),
}
