use super::error::BoardError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire byte for a White token
pub const WHITE_BYTE: u8 = 0x0F;
/// Wire byte for a Black token
pub const BLACK_BYTE: u8 = 0xF0;
/// Wire byte for an empty cell
pub const EMPTY_BYTE: u8 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// The side moving against this one
    pub fn opponent(&self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Side::White => WHITE_BYTE,
            Side::Black => BLACK_BYTE,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self, BoardError> {
        match byte {
            WHITE_BYTE => Ok(Side::White),
            BLACK_BYTE => Ok(Side::Black),
            other => Err(BoardError::InvalidSide(format!(
                "byte 0x{:02X} is not a side",
                other
            ))),
        }
    }

    /// Single-letter form used by board renderings
    pub fn symbol(&self) -> char {
        match self {
            Side::White => 'W',
            Side::Black => 'B',
        }
    }
}

/// Encode a board cell as its wire token
pub fn cell_to_byte(cell: Option<Side>) -> u8 {
    cell.map_or(EMPTY_BYTE, Side::to_byte)
}

/// Decode a wire token into a board cell
pub fn cell_from_byte(byte: u8) -> Result<Option<Side>, BoardError> {
    if byte == EMPTY_BYTE {
        Ok(None)
    } else {
        Side::from_byte(byte).map(Some)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "WHITE"),
            Side::Black => write!(f, "BLACK"),
        }
    }
}

impl FromStr for Side {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "white" | "w" => Ok(Side::White),
            "black" | "b" => Ok(Side::Black),
            _ => Err(BoardError::InvalidSide(format!(
                "Expected 'white' or 'black', got '{}'",
                s
            ))),
        }
    }
}
