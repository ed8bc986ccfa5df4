//! Players with predictable misbehaviour for exercising the referee

use anyhow::{bail, Result};
use konane::board::{Board, Move, Position};
use konane::game::{Player, PlayerRegistry, TurnContext};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Replays a fixed list of moves, then falls back to the first legal move
pub struct ScriptedPlayer {
    script: VecDeque<Move>,
}

impl ScriptedPlayer {
    pub fn new(script: Vec<Move>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl Player for ScriptedPlayer {
    fn name(&self) -> &str {
        "scripted"
    }

    fn make_move(&mut self, board: &Board, ctx: &TurnContext) -> Result<Option<Move>> {
        if let Some(mv) = self.script.pop_front() {
            return Ok(Some(mv));
        }
        Ok(Some(
            board
                .all_moves(ctx.side())
                .into_iter()
                .next()
                .unwrap_or_else(|| Move::forfeit(ctx.side())),
        ))
    }
}

/// Sleeps past any reasonable allowance, then returns a legal move.
///
/// `finished` flips once the late move has been produced, so tests can prove
/// the referee never used it.
pub struct SleepyPlayer {
    pub nap: Duration,
    pub finished: Arc<AtomicBool>,
    pub honour_cancel: bool,
}

impl SleepyPlayer {
    pub fn new(nap: Duration) -> Self {
        Self {
            nap,
            finished: Arc::new(AtomicBool::new(false)),
            honour_cancel: false,
        }
    }

    pub fn cooperative(nap: Duration) -> Self {
        Self {
            honour_cancel: true,
            ..Self::new(nap)
        }
    }
}

impl Player for SleepyPlayer {
    fn name(&self) -> &str {
        "sleepy"
    }

    fn make_move(&mut self, board: &Board, ctx: &TurnContext) -> Result<Option<Move>> {
        let start = Instant::now();
        while start.elapsed() < self.nap {
            if self.honour_cancel && ctx.is_cancelled() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        let mv = board
            .all_moves(ctx.side())
            .into_iter()
            .next()
            .unwrap_or_else(|| Move::forfeit(ctx.side()));
        self.finished.store(true, Ordering::SeqCst);
        Ok(Some(mv))
    }
}

pub struct PanickingPlayer;

impl Player for PanickingPlayer {
    fn name(&self) -> &str {
        "panicky"
    }

    fn make_move(&mut self, _board: &Board, _ctx: &TurnContext) -> Result<Option<Move>> {
        panic!("player blew up");
    }
}

/// Answers with nothing at all
pub struct SilentPlayer;

impl Player for SilentPlayer {
    fn name(&self) -> &str {
        "silent"
    }

    fn make_move(&mut self, _board: &Board, _ctx: &TurnContext) -> Result<Option<Move>> {
        Ok(None)
    }
}

pub struct FailingPlayer;

impl Player for FailingPlayer {
    fn name(&self) -> &str {
        "failing"
    }

    fn make_move(&mut self, _board: &Board, _ctx: &TurnContext) -> Result<Option<Move>> {
        bail!("search exploded")
    }
}

/// Always gives up
pub struct QuitterPlayer;

impl Player for QuitterPlayer {
    fn name(&self) -> &str {
        "quitter"
    }

    fn make_move(&mut self, _board: &Board, ctx: &TurnContext) -> Result<Option<Move>> {
        Ok(Some(Move::forfeit(ctx.side())))
    }
}

/// Plays the same off-rule jump every turn
pub struct CheatingPlayer;

impl Player for CheatingPlayer {
    fn name(&self) -> &str {
        "cheater"
    }

    fn make_move(&mut self, _board: &Board, ctx: &TurnContext) -> Result<Option<Move>> {
        Ok(Some(Move::new(
            Position::new(0, 0),
            Position::new(1, 1),
            ctx.side(),
            "sneaky",
        )))
    }
}

/// Built-in players plus the misbehaving ones above
pub fn test_registry() -> PlayerRegistry {
    let mut registry = PlayerRegistry::with_builtin();
    registry
        .register("sleepy", || Box::new(SleepyPlayer::cooperative(Duration::from_secs(5))))
        .unwrap();
    registry.register("panicky", || Box::new(PanickingPlayer)).unwrap();
    registry.register("silent", || Box::new(SilentPlayer)).unwrap();
    registry.register("failing", || Box::new(FailingPlayer)).unwrap();
    registry.register("quitter", || Box::new(QuitterPlayer)).unwrap();
    registry.register("cheater", || Box::new(CheatingPlayer)).unwrap();
    registry
}

/// Board with both sides' tokens placed explicitly, for rule tests
pub fn board_from(layout: &str) -> Board {
    layout.parse().unwrap()
}
