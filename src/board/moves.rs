use super::{Position, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest comment a move may carry, in bytes
pub const MAX_COMMENT_LEN: usize = 22;

pub const FORFEIT_COMMENT: &str = "**FORFEIT**";
pub const TIME_COMMENT: &str = "**TIME**";
pub const ERROR_COMMENT: &str = "**ERROR**";

/// Out-of-band outcomes carried in a move's comment instead of annotation text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveSignal {
    Forfeit,
    TimeExceeded,
    Error,
}

impl MoveSignal {
    pub fn comment(&self) -> &'static str {
        match self {
            MoveSignal::Forfeit => FORFEIT_COMMENT,
            MoveSignal::TimeExceeded => TIME_COMMENT,
            MoveSignal::Error => ERROR_COMMENT,
        }
    }

    pub fn from_comment(comment: &str) -> Option<Self> {
        match comment {
            FORFEIT_COMMENT => Some(MoveSignal::Forfeit),
            TIME_COMMENT => Some(MoveSignal::TimeExceeded),
            ERROR_COMMENT => Some(MoveSignal::Error),
            _ => None,
        }
    }
}

impl fmt::Display for MoveSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveSignal::Forfeit => write!(f, "forfeit"),
            MoveSignal::TimeExceeded => write!(f, "time exceeded"),
            MoveSignal::Error => write!(f, "error"),
        }
    }
}

/// An immutable Konane move: a straight-line jump from `from` to `to` by `side`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    from: Position,
    to: Position,
    side: Side,
    comment: String,
}

impl Move {
    /// Build a move; the comment is forced to ASCII and cut to 22 bytes
    pub fn new(from: Position, to: Position, side: Side, comment: impl AsRef<str>) -> Self {
        Self {
            from,
            to,
            side,
            comment: sanitize_comment(comment.as_ref()),
        }
    }

    /// A plain move with no comment
    pub fn jump(from: Position, to: Position, side: Side) -> Self {
        Self::new(from, to, side, "")
    }

    /// Sentinel move carrying an out-of-band signal and off-board coordinates
    pub fn signal(side: Side, signal: MoveSignal) -> Self {
        Self::new(
            Position::OFF_BOARD,
            Position::OFF_BOARD,
            side,
            signal.comment(),
        )
    }

    pub fn forfeit(side: Side) -> Self {
        Self::signal(side, MoveSignal::Forfeit)
    }

    pub fn time_exceeded(side: Side) -> Self {
        Self::signal(side, MoveSignal::TimeExceeded)
    }

    pub fn error(side: Side) -> Self {
        Self::signal(side, MoveSignal::Error)
    }

    pub fn from(&self) -> Position {
        self.from
    }

    pub fn to(&self) -> Position {
        self.to
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// The out-of-band signal this move carries, if any
    pub fn sentinel(&self) -> Option<MoveSignal> {
        MoveSignal::from_comment(&self.comment)
    }

    pub fn is_sentinel(&self) -> bool {
        self.sentinel().is_some()
    }

    /// Same move attributed to another side
    pub fn with_side(self, side: Side) -> Self {
        Self { side, ..self }
    }
}

fn sanitize_comment(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii() { c } else { '?' })
        .take(MAX_COMMENT_LEN)
        .collect()
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {} for {}", self.from, self.to, self.side)?;
        if !self.comment.is_empty() {
            write!(f, " with {}", self.comment)?;
        }
        Ok(())
    }
}
