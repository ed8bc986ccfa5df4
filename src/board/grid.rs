use super::moves::Move;
use super::position::Direction;
use super::{BoardError, Position, Side};
use std::fmt;
use std::str::FromStr;

/// Largest width or height a board may have
pub const MAX_DIMENSION: u8 = 127;

/// A Konane board: a width x height grid of cells, each empty or holding one side's token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    width: u8,
    height: u8,
    /// Row-major cell storage
    cells: Vec<Option<Side>>,
}

impl Board {
    /// Create a starting board.
    ///
    /// Dimensions above 127 are clamped. Tokens alternate in a checkerboard with
    /// White on (0,0), and the two cells right of centre on the middle row start empty.
    pub fn new(width: usize, height: usize) -> Result<Self, BoardError> {
        let width = width.min(MAX_DIMENSION as usize);
        let height = height.min(MAX_DIMENSION as usize);
        Self::validate_dimensions(width, height)?;

        let (width, height) = (width as u8, height as u8);
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height {
            for col in 0..width {
                let side = if (u16::from(col) + u16::from(row)) % 2 == 1 {
                    Side::Black
                } else {
                    Side::White
                };
                cells.push(Some(side));
            }
        }

        let mut board = Self {
            width,
            height,
            cells,
        };
        let (col, row) = ((width - 1) / 2, (height - 1) / 2);
        board.clear(Position::new(col, row));
        board.clear(Position::new(col + 1, row));
        Ok(board)
    }

    /// Rebuild a board from row-major cells, as carried by a board sync
    pub fn from_tokens(width: u8, height: u8, cells: Vec<Option<Side>>) -> Result<Self, BoardError> {
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(BoardError::InvalidDimensions {
                width: width as usize,
                height: height as usize,
            });
        }
        Self::validate_dimensions(width as usize, height as usize)?;

        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(BoardError::TokenCount {
                expected,
                actual: cells.len(),
            });
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    fn validate_dimensions(width: usize, height: usize) -> Result<(), BoardError> {
        if width < 2 || height < 1 {
            return Err(BoardError::InvalidDimensions { width, height });
        }
        Ok(())
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Row-major view of every cell
    pub fn cells(&self) -> &[Option<Side>] {
        &self.cells
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        position.col < self.width && position.row < self.height
    }

    fn index(&self, position: Position) -> usize {
        position.row as usize * self.width as usize + position.col as usize
    }

    /// Token at a cell, or `OutOfBounds` for addresses off the grid
    pub fn token_at(&self, position: Position) -> Result<Option<Side>, BoardError> {
        if !self.in_bounds(position) {
            return Err(BoardError::OutOfBounds {
                col: position.col,
                row: position.row,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.cells[self.index(position)])
    }

    // Callers guarantee bounds
    fn cell(&self, position: Position) -> Option<Side> {
        self.cells[self.index(position)]
    }

    fn set(&mut self, position: Position, side: Side) {
        let idx = self.index(position);
        self.cells[idx] = Some(side);
    }

    fn clear(&mut self, position: Position) {
        let idx = self.index(position);
        self.cells[idx] = None;
    }

    /// Number of tokens a side has on the board
    pub fn count(&self, side: Side) -> usize {
        self.cells.iter().filter(|cell| **cell == Some(side)).count()
    }

    /// Whether `side` may jump from `from` to `to`
    pub fn is_legal(&self, from: Position, to: Position, side: Side) -> bool {
        self.check(from, to, side).is_ok()
    }

    /// Validate a move, describing the first rule it breaks
    pub fn check_move(&self, mv: &Move) -> Result<(), BoardError> {
        self.check(mv.from(), mv.to(), mv.side())
    }

    fn check(&self, from: Position, to: Position, side: Side) -> Result<(), BoardError> {
        if !self.in_bounds(from) || !self.in_bounds(to) {
            return Err(BoardError::IllegalMove(format!(
                "{} to {} leaves the {}x{} board",
                from, to, self.width, self.height
            )));
        }
        if from == to {
            return Err(BoardError::IllegalMove(format!(
                "{} does not move anywhere",
                from
            )));
        }

        let dcol = i16::from(to.col) - i16::from(from.col);
        let drow = i16::from(to.row) - i16::from(from.row);
        if dcol != 0 && drow != 0 {
            return Err(BoardError::IllegalMove(format!(
                "{} to {} is not along a row or column",
                from, to
            )));
        }

        let distance = dcol.abs().max(drow.abs());
        if distance % 2 != 0 {
            return Err(BoardError::IllegalMove(format!(
                "{} to {} covers an odd distance of {}",
                from, to, distance
            )));
        }

        if self.cell(from) != Some(side) {
            return Err(BoardError::IllegalMove(format!(
                "{} does not hold a {} token",
                from, side
            )));
        }
        if self.cell(to).is_some() {
            return Err(BoardError::IllegalMove(format!("{} is occupied", to)));
        }

        let (step_col, step_row) = (dcol.signum(), drow.signum());
        let opponent = side.opponent();
        let mut hop = 2;
        while hop <= distance {
            let jumped = step(from, step_col, step_row, hop - 1);
            let landing = step(from, step_col, step_row, hop);
            if self.cell(jumped) != Some(opponent) {
                return Err(BoardError::IllegalMove(format!(
                    "{} does not hold a {} token to jump",
                    jumped, opponent
                )));
            }
            if self.cell(landing).is_some() {
                return Err(BoardError::IllegalMove(format!(
                    "landing cell {} is occupied",
                    landing
                )));
            }
            hop += 2;
        }

        Ok(())
    }

    /// Every jump available to the token at `position`.
    ///
    /// Each direction (Down, Up, Right, Left) is scanned outward two cells at a
    /// time; a move is offered for every landing cell reached by consecutive
    /// captures, and the scan stops at the first hop that fails.
    pub fn moves_from(&self, position: Position, side: Side) -> Vec<Move> {
        let mut moves = Vec::new();
        if !self.in_bounds(position) || self.cell(position) != Some(side) {
            return moves;
        }

        let opponent = side.opponent();
        for direction in Direction::ALL {
            let (dcol, drow) = direction.delta();
            let mut hop = 2;
            loop {
                let (Some(jumped), Some(landing)) = (
                    position.offset(dcol * (hop - 1), drow * (hop - 1)),
                    position.offset(dcol * hop, drow * hop),
                ) else {
                    break;
                };
                if !self.in_bounds(landing)
                    || self.cell(jumped) != Some(opponent)
                    || self.cell(landing).is_some()
                {
                    break;
                }
                moves.push(Move::jump(position, landing, side));
                hop += 2;
            }
        }
        moves
    }

    /// All legal moves for `side`, row-major by origin cell
    pub fn all_moves(&self, side: Side) -> Vec<Move> {
        let mut moves = Vec::new();
        for row in 0..self.height {
            for col in 0..self.width {
                moves.extend(self.moves_from(Position::new(col, row), side));
            }
        }
        moves
    }

    pub fn has_moves(&self, side: Side) -> bool {
        !self.all_moves(side).is_empty()
    }

    /// Apply a move. Illegal moves leave the board untouched.
    pub fn apply(&mut self, mv: &Move) -> Result<(), BoardError> {
        self.check_move(mv)?;

        let from = mv.from();
        let to = mv.to();
        let dcol = (i16::from(to.col) - i16::from(from.col)).signum();
        let drow = (i16::from(to.row) - i16::from(from.row)).signum();
        let distance = (i16::from(to.col) - i16::from(from.col))
            .abs()
            .max((i16::from(to.row) - i16::from(from.row)).abs());

        self.clear(from);
        for offset in 1..distance {
            self.clear(step(from, dcol, drow, offset));
        }
        self.set(to, mv.side());
        Ok(())
    }
}

// Only called on paths already known to stay on the board
fn step(from: Position, dcol: i16, drow: i16, count: i16) -> Position {
    Position::new(
        (i16::from(from.col) + dcol * count) as u8,
        (i16::from(from.row) + drow * count) as u8,
    )
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.height {
            for col in 0..self.width {
                let symbol = self.cell(Position::new(col, row)).map_or('_', |s| s.symbol());
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parse the rendering produced by `Display`: one row per line, `W`, `B` or `_` per cell
impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut width = None;
        let mut cells = Vec::new();
        let mut height = 0usize;

        for line in s.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let row: Vec<Option<Side>> = line
                .split_whitespace()
                .map(|token| match token {
                    "W" | "w" => Ok(Some(Side::White)),
                    "B" | "b" => Ok(Some(Side::Black)),
                    "_" | "." => Ok(None),
                    other => Err(BoardError::InvalidLayout(format!(
                        "unknown cell '{}'",
                        other
                    ))),
                })
                .collect::<Result<_, _>>()?;

            match width {
                None => width = Some(row.len()),
                Some(w) if w != row.len() => {
                    return Err(BoardError::InvalidLayout(format!(
                        "row {} has {} cells, expected {}",
                        height,
                        row.len(),
                        w
                    )))
                }
                Some(_) => {}
            }
            cells.extend(row);
            height += 1;
        }

        let width = width.unwrap_or(0);
        if width > MAX_DIMENSION as usize || height > MAX_DIMENSION as usize {
            return Err(BoardError::InvalidDimensions { width, height });
        }
        Board::from_tokens(width as u8, height as u8, cells)
    }
}
