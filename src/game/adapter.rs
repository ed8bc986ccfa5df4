use super::player::{Player, TurnContext};
use crate::board::{Board, Move, MoveSignal, Side};
use anyhow::anyhow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

type MoveTask = JoinHandle<anyhow::Result<Option<Move>>>;

/// A computation that outlived its deadline, kept so it can be joined later
struct Overrun {
    handle: MoveTask,
    cancel: Arc<AtomicBool>,
}

/// Result of asking a player for a move
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub mv: Move,
    /// Wall-clock time from invocation to completion or deadline
    pub elapsed: Duration,
}

impl TurnOutcome {
    pub fn signal(&self) -> Option<MoveSignal> {
        self.mv.sentinel()
    }
}

/// Runs a [`Player`] under a hard deadline, turning faults and overruns into sentinel moves
pub struct PlayerAdapter {
    side: Side,
    name: String,
    player: Arc<Mutex<Box<dyn Player>>>,
    overruns: Vec<Overrun>,
}

impl PlayerAdapter {
    pub fn new(side: Side, player: Box<dyn Player>) -> Self {
        let name = player.name().to_string();
        Self {
            side,
            name,
            player: Arc::new(Mutex::new(player)),
            overruns: Vec::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Computations that missed their deadline and have not been joined yet
    pub fn outstanding(&self) -> usize {
        self.overruns.len()
    }

    /// Ask the player for a move on a copy of `board`, waiting at most `allowance`.
    ///
    /// Never fails: errors, panics and empty answers become `**ERROR**`, and an
    /// answer after the deadline becomes `**TIME**` with the late move discarded.
    #[instrument(skip(self, board), fields(side = %self.side, player = %self.name))]
    pub async fn request_move(&mut self, board: &Board, allowance: Duration) -> TurnOutcome {
        self.reap_finished();

        let snapshot = board.clone();
        let ctx = TurnContext::new(self.side, allowance);
        let cancel = ctx.cancel_handle();
        let player = Arc::clone(&self.player);

        let start = Instant::now();
        let mut handle = tokio::task::spawn_blocking(move || {
            let mut player = player
                .lock()
                .map_err(|_| anyhow!("player state was poisoned by an earlier panic"))?;
            player.make_move(&snapshot, &ctx)
        });

        let waited = tokio::time::timeout(allowance, &mut handle).await;
        let elapsed = start.elapsed();

        let mv = match waited {
            Ok(Ok(Ok(Some(mv)))) => {
                if mv.side() != self.side {
                    warn!(reported = %mv.side(), "Player reported a move for the wrong side");
                    mv.with_side(self.side)
                } else {
                    mv
                }
            }
            Ok(Ok(Ok(None))) => {
                warn!("Player returned no move");
                Move::error(self.side)
            }
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "Player failed to produce a move");
                Move::error(self.side)
            }
            Ok(Err(join_error)) => {
                warn!(error = %join_error, "Player task panicked");
                Move::error(self.side)
            }
            Err(_elapsed) => {
                info!(allowance = ?allowance, "Player exceeded its allowance");
                cancel.store(true, Ordering::Relaxed);
                self.overruns.push(Overrun { handle, cancel });
                Move::time_exceeded(self.side)
            }
        };

        debug!(elapsed = ?elapsed, mv = %mv, "Player turn finished");
        TurnOutcome { mv, elapsed }
    }

    fn reap_finished(&mut self) {
        self.overruns.retain(|overrun| !overrun.handle.is_finished());
    }

    /// Join any overrunning computations, waiting up to `grace` for each.
    ///
    /// Returns how many were still running when the grace period ran out.
    pub async fn finish(&mut self, grace: Duration) -> usize {
        let mut still_running = 0;
        for overrun in self.overruns.drain(..) {
            overrun.cancel.store(true, Ordering::Relaxed);
            match tokio::time::timeout(grace, overrun.handle).await {
                Ok(_) => debug!("Joined overrunning player task"),
                Err(_) => {
                    warn!(grace = ?grace, "Player task ignored cancellation; detaching");
                    still_running += 1;
                }
            }
        }
        still_running
    }
}
