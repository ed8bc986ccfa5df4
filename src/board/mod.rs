pub mod error;
pub mod grid;
pub mod moves;
pub mod position;
pub mod side;

pub use error::BoardError;
pub use grid::{Board, MAX_DIMENSION};
pub use moves::{Move, MoveSignal, MAX_COMMENT_LEN};
pub use position::{Direction, Position};
pub use side::Side;
