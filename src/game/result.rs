use crate::board::Side;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Why a match stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndReason {
    /// The loser had no legal reply
    NoLegalMoves,
    Forfeit,
    /// The loser's clock ran out
    TimeExceeded,
    /// The loser's player failed or answered nothing
    PlayerError,
    IllegalMove { detail: String },
    /// A remote peer stayed silent past the protocol timeout
    ProtocolTimeout,
    Disconnected,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::NoLegalMoves => write!(f, "no legal moves left"),
            EndReason::Forfeit => write!(f, "forfeit"),
            EndReason::TimeExceeded => write!(f, "time exceeded"),
            EndReason::PlayerError => write!(f, "player error"),
            EndReason::IllegalMove { detail } => write!(f, "illegal move ({})", detail),
            EndReason::ProtocolTimeout => write!(f, "no reply within protocol timeout"),
            EndReason::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Summary of a finished match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: Uuid,
    pub total_time_ms: i64,
    pub width: u8,
    pub height: u8,
    pub white: String,
    pub white_remaining_ms: i64,
    pub black: String,
    pub black_remaining_ms: i64,
    pub winner: Option<Side>,
    pub reason: EndReason,
    /// Completed White/Black move pairs
    pub move_pairs: u32,
}

impl MatchResult {
    /// Identifier of the winning player, if any
    pub fn winner_name(&self) -> Option<&str> {
        match self.winner? {
            Side::White => Some(&self.white),
            Side::Black => Some(&self.black),
        }
    }

    pub fn loser(&self) -> Option<Side> {
        self.winner.map(|side| side.opponent())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} x {} Board. {} milliseconds.",
            self.width, self.height, self.total_time_ms
        )?;
        writeln!(f, "{} playing WHITE. {} playing BLACK.", self.white, self.black)?;
        writeln!(
            f,
            "{} wins in {} moves ({}).",
            self.winner_name().unwrap_or("nobody"),
            self.move_pairs,
            self.reason
        )?;
        writeln!(f, "WHITE time left: {}", self.white_remaining_ms)?;
        writeln!(f, "BLACK time left: {}", self.black_remaining_ms)
    }
}

/// How a match attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Finished(MatchResult),
    /// Voided before play started; no winner is recorded
    Aborted { reason: String },
}

impl MatchOutcome {
    pub fn result(&self) -> Option<&MatchResult> {
        match self {
            MatchOutcome::Finished(result) => Some(result),
            MatchOutcome::Aborted { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<MatchResult, String> {
        match self {
            MatchOutcome::Finished(result) => Ok(result),
            MatchOutcome::Aborted { reason } => Err(reason),
        }
    }

    pub fn winner(&self) -> Option<Side> {
        self.result().and_then(|result| result.winner)
    }
}
