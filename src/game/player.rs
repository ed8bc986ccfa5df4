use crate::board::{Board, Move, Side};
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What a player knows about the turn it is asked to play
#[derive(Debug, Clone)]
pub struct TurnContext {
    side: Side,
    allowance: Duration,
    cancel: Arc<AtomicBool>,
}

impl TurnContext {
    pub fn new(side: Side, allowance: Duration) -> Self {
        Self {
            side,
            allowance,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Wall-clock time the player may spend on this move
    pub fn allowance(&self) -> Duration {
        self.allowance
    }

    /// Set once the referee has stopped waiting; long searches should bail out
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub(crate) fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }
}

/// A Konane decision capability.
///
/// Called from a blocking worker thread with a private copy of the board.
/// Returning `Ok(None)` or an error is reported as an error sentinel; a player
/// with nothing to play should return [`Move::forfeit`].
pub trait Player: Send {
    /// Display name of this player
    fn name(&self) -> &str;

    /// Choose a move for `ctx.side()`
    fn make_move(&mut self, board: &Board, ctx: &TurnContext) -> Result<Option<Move>>;
}
