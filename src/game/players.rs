//! Built-in reference players

use super::player::{Player, TurnContext};
use crate::board::{Board, Move};
use anyhow::Result;
use rand::seq::SliceRandom;

/// Plays a uniformly random legal move
#[derive(Debug, Default)]
pub struct RandomPlayer;

impl Player for RandomPlayer {
    fn name(&self) -> &str {
        "random"
    }

    fn make_move(&mut self, board: &Board, ctx: &TurnContext) -> Result<Option<Move>> {
        let moves = board.all_moves(ctx.side());
        let choice = moves
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| Move::forfeit(ctx.side()));
        Ok(Some(choice))
    }
}

/// Plays the first legal move in enumeration order
#[derive(Debug, Default)]
pub struct FirstMovePlayer;

impl Player for FirstMovePlayer {
    fn name(&self) -> &str {
        "first"
    }

    fn make_move(&mut self, board: &Board, ctx: &TurnContext) -> Result<Option<Move>> {
        let mv = board
            .all_moves(ctx.side())
            .into_iter()
            .next()
            .unwrap_or_else(|| Move::forfeit(ctx.side()));
        Ok(Some(mv))
    }
}

/// Picks the move that leaves the opponent the fewest replies
#[derive(Debug, Default)]
pub struct GreedyPlayer;

impl Player for GreedyPlayer {
    fn name(&self) -> &str {
        "greedy"
    }

    fn make_move(&mut self, board: &Board, ctx: &TurnContext) -> Result<Option<Move>> {
        let side = ctx.side();
        let mut best: Option<(usize, Move)> = None;

        for mv in board.all_moves(side) {
            if ctx.is_cancelled() {
                break;
            }
            let mut after = board.clone();
            after.apply(&mv)?;
            let replies = after.all_moves(side.opponent()).len();
            if best.as_ref().map_or(true, |(fewest, _)| replies < *fewest) {
                best = Some((replies, mv));
            }
        }

        Ok(Some(best.map_or_else(|| Move::forfeit(side), |(_, mv)| mv)))
    }
}
