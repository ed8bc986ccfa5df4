use crate::board::{Board, Move, Side};
use crate::game::{PlayerAdapter, PlayerRegistry, TimeBudget};
use crate::messages::wire::{PacketStream, WireConfig, WireProtocolError};
use crate::messages::{Packet, TurnReply};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, instrument, warn};

/// Grace period for joining an overrunning player when the referee resets
const RESET_GRACE: Duration = Duration::from_secs(1);

/// How a client session with a referee ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Referee sent disconnect
    Disconnected,
    /// Referee closed the stream
    Closed,
}

/// The player side of the protocol: hosts one player and answers the referee
pub struct PlayerClient {
    side: Side,
    registry: Arc<PlayerRegistry>,
    adapter: Option<PlayerAdapter>,
    board: Option<Board>,
    total_time_ms: i64,
    budget: TimeBudget,
}

impl PlayerClient {
    pub fn new(side: Side, registry: Arc<PlayerRegistry>) -> Self {
        Self {
            side,
            registry,
            adapter: None,
            board: None,
            total_time_ms: 0,
            budget: TimeBudget::from_millis(0),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// The client's copy of the board, once the referee has described it
    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn budget(&self) -> TimeBudget {
        self.budget
    }

    /// Serve one referee connection until it disconnects or closes the stream
    #[instrument(skip(self, stream, wire_config), fields(side = %self.side))]
    pub async fn run<S>(&mut self, stream: S, wire_config: WireConfig) -> Result<SessionEnd, WireProtocolError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut stream = PacketStream::new(stream, wire_config);
        info!("Serving referee");

        loop {
            let packet = match stream.recv().await {
                Ok(packet) => packet,
                Err(WireProtocolError::ConnectionClosed) => {
                    info!("Referee closed the connection");
                    self.finish().await;
                    return Ok(SessionEnd::Closed);
                }
                Err(WireProtocolError::Format(e)) => {
                    warn!(error = %e, "Ignoring malformed packet");
                    continue;
                }
                Err(e) => {
                    self.finish().await;
                    return Err(e);
                }
            };

            debug!(opcode = %packet.opcode(), "Received request");
            let reply = match packet {
                Packet::Name(name) => {
                    self.load_player(&name);
                    Some(Packet::NameAck)
                }
                Packet::Time(ms) => {
                    self.total_time_ms = ms;
                    self.budget = TimeBudget::from_millis(ms);
                    Some(Packet::TimeAck)
                }
                Packet::Board { width, height } => {
                    match Board::new(width as usize, height as usize) {
                        Ok(board) => self.board = Some(board),
                        Err(e) => {
                            warn!(error = %e, "Referee described an unusable board");
                            self.board = None;
                        }
                    }
                    Some(Packet::BoardAck)
                }
                Packet::BoardSync(board) => {
                    self.board = Some(board);
                    Some(Packet::BoardSyncAck)
                }
                Packet::BeginTurn => {
                    let mv = self.take_turn().await;
                    info!(mv = %mv, remaining = self.budget.remaining_ms(), "Replying with move");
                    Some(Packet::BeginTurnAck(TurnReply::from(&mv)))
                }
                Packet::EndTurn => Some(Packet::EndTurnAck),
                Packet::Move(mv) => self.apply_opponent_move(&mv),
                Packet::Reset => {
                    info!("Referee reset the match");
                    self.finish().await;
                    self.board = None;
                    self.budget = TimeBudget::from_millis(self.total_time_ms);
                    None
                }
                Packet::Disconnect => {
                    info!("Referee disconnected");
                    self.finish().await;
                    return Ok(SessionEnd::Disconnected);
                }
                other => {
                    debug!(opcode = %other.opcode(), "Ignoring unsolicited packet");
                    None
                }
            };

            if let Some(reply) = reply {
                stream.send(&reply).await?;
            }
        }
    }

    fn load_player(&mut self, name: &str) {
        match self.registry.create(name) {
            Ok(player) => {
                info!(player = %name, "Loaded player");
                self.adapter = Some(PlayerAdapter::new(self.side, player));
            }
            Err(e) => {
                warn!(error = %e, "Cannot load requested player; turns will report errors");
                self.adapter = None;
            }
        }
    }

    /// Compute, validate and locally apply this side's move
    async fn take_turn(&mut self) -> Move {
        let (Some(adapter), Some(board)) = (self.adapter.as_mut(), self.board.as_mut()) else {
            warn!("Asked to move before a player and board were set up");
            return Move::error(self.side);
        };

        let outcome = adapter.request_move(board, self.budget.allowance()).await;
        self.budget.charge(outcome.elapsed);
        if self.budget.is_exhausted() {
            return Move::time_exceeded(self.side);
        }

        let mv = outcome.mv;
        if mv.is_sentinel() {
            return mv;
        }
        match board.apply(&mv) {
            Ok(()) => mv,
            Err(e) => {
                warn!(error = %e, mv = %mv, "Player produced an illegal move");
                Move::error(self.side)
            }
        }
    }

    /// Opponent moves are acknowledged only once they apply cleanly here
    fn apply_opponent_move(&mut self, mv: &Move) -> Option<Packet> {
        let Some(board) = self.board.as_mut() else {
            warn!(mv = %mv, "Received a move with no board");
            return None;
        };
        match board.apply(mv) {
            Ok(()) => Some(Packet::MoveAck),
            Err(e) => {
                warn!(error = %e, mv = %mv, "Relayed move does not fit the local board");
                None
            }
        }
    }

    async fn finish(&mut self) {
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.finish(RESET_GRACE).await;
        }
    }
}
