use serde::{Deserialize, Serialize};
use std::fmt;

/// A board cell address; `col` grows to the right and `row` grows downward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub col: u8,
    pub row: u8,
}

impl Position {
    /// Off-board marker carried by sentinel moves. Encodes as 0xFF on the wire.
    pub const OFF_BOARD: Position = Position {
        col: u8::MAX,
        row: u8::MAX,
    };

    pub const fn new(col: u8, row: u8) -> Self {
        Self { col, row }
    }

    pub fn is_off_board(&self) -> bool {
        *self == Self::OFF_BOARD
    }

    /// Step by a signed offset, returning `None` if either coordinate leaves `u8` range
    pub fn offset(&self, dcol: i16, drow: i16) -> Option<Position> {
        let col = i16::from(self.col) + dcol;
        let row = i16::from(self.row) + drow;
        if (0..=i16::from(u8::MAX)).contains(&col) && (0..=i16::from(u8::MAX)).contains(&row) {
            Some(Position::new(col as u8, row as u8))
        } else {
            None
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_off_board() {
            write!(f, "(-1,-1)")
        } else {
            write!(f, "({},{})", self.col, self.row)
        }
    }
}

/// The four axis directions scanned during move generation, in enumeration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
    Right,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Down,
        Direction::Up,
        Direction::Right,
        Direction::Left,
    ];

    /// Unit step as (dcol, drow)
    pub fn delta(&self) -> (i16, i16) {
        match self {
            Direction::Down => (0, 1),
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
        }
    }
}
