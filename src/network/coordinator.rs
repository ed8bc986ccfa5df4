//! The referee's match state machine
//!
//! A match moves through `Connecting -> Handshake -> AwaitMove(side) ->
//! Apply(side) -> AwaitMove(other) -> ... -> Terminal`. Each side is a seat:
//! either a remote player client reached over the packet protocol, or a
//! local player run through a [`PlayerAdapter`].

use super::connection::{self, ConnectionError, PeerConnection};
use crate::board::{Board, BoardError, Move, MoveSignal, Side};
use crate::game::{
    DisplaySink, EndReason, MatchOutcome, MatchResult, PlayerAdapter, TimeBudget,
};
use crate::messages::{Packet, WireConfig, DEFAULT_PROTOCOL_TIMEOUT};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// How long to wait for an overrunning local player once the match is over
pub const DEFAULT_FINISH_GRACE: Duration = Duration::from_secs(2);

/// Parameters shared by both sides of a match
#[derive(Debug, Clone)]
pub struct MatchSettings {
    pub width: usize,
    pub height: usize,
    pub total_time_ms: i64,
    /// Bound on every reply read from a remote peer
    pub protocol_timeout: Duration,
    /// Surface rule-violation diagnostics on the display sink
    pub verbose: bool,
    pub finish_grace: Duration,
}

impl MatchSettings {
    pub fn new(width: usize, height: usize, total_time_ms: i64) -> Self {
        Self {
            width,
            height,
            total_time_ms,
            protocol_timeout: DEFAULT_PROTOCOL_TIMEOUT,
            verbose: true,
            finish_grace: DEFAULT_FINISH_GRACE,
        }
    }

    pub fn with_protocol_timeout(mut self, timeout: Duration) -> Self {
        self.protocol_timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Who plays one side of a match
pub enum Seat<S = TcpStream> {
    /// A player client; `player` is the identifier it is told to load
    Remote {
        player: String,
        conn: PeerConnection<S>,
    },
    Local(PlayerAdapter),
}

impl<S> Seat<S> {
    pub fn remote(player: impl Into<String>, conn: PeerConnection<S>) -> Self {
        Seat::Remote {
            player: player.into(),
            conn,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Seat::Remote { player, .. } => player,
            Seat::Local(adapter) => adapter.name(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Seat::Remote { .. })
    }
}

struct SeatState<S> {
    seat: Seat<S>,
    budget: TimeBudget,
}

/// Why a side's turn ended without a move to apply
struct TurnFailure {
    reason: EndReason,
}

/// Owns the authoritative board and drives one match to completion
pub struct TurnCoordinator<S = TcpStream> {
    id: Uuid,
    settings: MatchSettings,
    board: Board,
    white: SeatState<S>,
    black: SeatState<S>,
    sink: Arc<dyn DisplaySink>,
    move_pairs: u32,
}

impl<S> TurnCoordinator<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        settings: MatchSettings,
        white: Seat<S>,
        black: Seat<S>,
        sink: Arc<dyn DisplaySink>,
    ) -> Result<Self, BoardError> {
        let board = Board::new(settings.width, settings.height)?;
        let budget = TimeBudget::from_millis(settings.total_time_ms);
        Ok(Self {
            id: Uuid::new_v4(),
            settings,
            board,
            white: SeatState { seat: white, budget },
            black: SeatState { seat: black, budget },
            sink,
            move_pairs: 0,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    fn seat(&self, side: Side) -> &SeatState<S> {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    fn seat_mut(&mut self, side: Side) -> &mut SeatState<S> {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }

    fn status(&self, line: impl AsRef<str>) {
        self.sink.status(line.as_ref());
    }

    /// Play the match. Never fails: every path ends in a result or an abort.
    #[instrument(skip(self), fields(match_id = %self.id))]
    pub async fn run(mut self) -> MatchOutcome {
        info!(
            white = %self.white.seat.name(),
            black = %self.black.seat.name(),
            width = self.board.width(),
            height = self.board.height(),
            "Starting match"
        );
        self.status(format!(
            "{} x {} board, {} ms each. {} playing WHITE, {} playing BLACK.",
            self.board.width(),
            self.board.height(),
            self.settings.total_time_ms,
            self.white.seat.name(),
            self.black.seat.name()
        ));

        if let Err(e) = self.handshake().await {
            error!(error = %e, "Handshake failed; voiding match");
            let reason = format!("handshake failed: {}", e);
            self.status(format!("Match aborted: {}", reason));
            self.release().await;
            return MatchOutcome::Aborted { reason };
        }
        self.status(self.board.to_string());

        let (winner, reason) = self.play().await;
        let result = self.result(winner, reason);
        info!(winner = ?result.winner, reason = %result.reason, moves = result.move_pairs, "Match finished");
        self.status(result.to_string());

        self.release().await;
        MatchOutcome::Finished(result)
    }

    /// Names, then times, then board dimensions, then a full sync; each step
    /// goes to White before Black
    async fn handshake(&mut self) -> Result<(), ConnectionError> {
        let width = self.board.width();
        let height = self.board.height();
        let total = self.settings.total_time_ms;

        // `None` is each seat's own Name
        let steps = [
            None,
            Some(Packet::Time(total)),
            Some(Packet::Board { width, height }),
            Some(Packet::BoardSync(self.board.clone())),
        ];
        for step in &steps {
            for side in [Side::White, Side::Black] {
                let Seat::Remote { player, conn } = &mut self.seat_mut(side).seat else {
                    continue;
                };
                let packet = step
                    .clone()
                    .unwrap_or_else(|| Packet::Name(player.clone()));
                acknowledge(conn, &packet).await?;
            }
        }

        debug!("Handshake complete");
        self.status("Handshake complete");
        Ok(())
    }

    async fn play(&mut self) -> (Option<Side>, EndReason) {
        let mut side = Side::White;
        loop {
            let opponent = side.opponent();
            let mv = match self.await_move(side).await {
                Ok(mv) => mv,
                Err(failure) => {
                    self.status(format!("{} loses: {}", side, failure.reason));
                    return (Some(opponent), failure.reason);
                }
            };

            if let Some(signal) = mv.sentinel() {
                self.status(format!(
                    "{} ({}) signalled {}",
                    side,
                    self.seat(side).seat.name(),
                    signal
                ));
                return (Some(opponent), reason_for(signal));
            }

            if let Err(e) = self.board.apply(&mv) {
                warn!(side = %side, error = %e, "Rejected illegal move");
                if self.settings.verbose {
                    self.status(format!("Illegal move {}: {}", mv, e));
                }
                let detail = match e {
                    BoardError::IllegalMove(detail) => detail,
                    other => other.to_string(),
                };
                return (Some(opponent), EndReason::IllegalMove { detail });
            }

            self.status(mv.to_string());
            self.status(self.board.to_string());
            if side == Side::Black {
                self.move_pairs += 1;
            }

            if !self.board.has_moves(opponent) {
                self.status(format!("{} has no legal moves", opponent));
                return (Some(side), EndReason::NoLegalMoves);
            }

            if let Err(failure) = self.relay(opponent, &mv).await {
                self.status(format!("{} loses: {}", opponent, failure.reason));
                return (Some(side), failure.reason);
            }

            side = opponent;
        }
    }

    /// AwaitMove(side): obtain the side's reply, charging its clock
    async fn await_move(&mut self, side: Side) -> Result<Move, TurnFailure> {
        let protocol_timeout = self.settings.protocol_timeout;
        let snapshot = &self.board;
        let state = match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        };
        let allowance = state.budget.allowance();
        debug!(side = %side, allowance = ?allowance, "Awaiting move");

        match &mut state.seat {
            Seat::Local(adapter) => {
                let outcome = adapter.request_move(snapshot, allowance).await;
                let remaining = state.budget.charge(outcome.elapsed);
                if state.budget.is_exhausted() && !outcome.mv.is_sentinel() {
                    info!(side = %side, remaining, "Local player ran out of time");
                    return Ok(Move::time_exceeded(side));
                }
                Ok(outcome.mv)
            }
            Seat::Remote { conn, .. } => {
                let start = Instant::now();
                let reply = conn.request_move(protocol_timeout).await;
                state.budget.charge(start.elapsed());

                match reply {
                    Ok(reply) => Ok(reply.into_move(side)),
                    Err(e) if e.is_timeout() => {
                        warn!(side = %side, error = %e, "No reply within protocol timeout");
                        conn.notify(&Packet::EndTurn).await;
                        Err(TurnFailure {
                            reason: EndReason::ProtocolTimeout,
                        })
                    }
                    Err(e) if e.is_transport_failure() => {
                        warn!(side = %side, error = %e, "Peer dropped mid-match");
                        Err(TurnFailure {
                            reason: EndReason::Disconnected,
                        })
                    }
                    Err(e) => {
                        warn!(side = %side, error = %e, "Unreadable turn reply");
                        Ok(Move::error(side))
                    }
                }
            }
        }
    }

    /// Tell the other side about an applied move so its local board stays in step
    async fn relay(&mut self, to: Side, mv: &Move) -> Result<(), TurnFailure> {
        let Seat::Remote { conn, .. } = &mut self.seat_mut(to).seat else {
            return Ok(());
        };

        match conn.request_ack(&Packet::Move(mv.clone())).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_transport_failure() => Err(TurnFailure {
                reason: EndReason::Disconnected,
            }),
            Err(e) => {
                warn!(side = %to, error = %e, "Move was not acknowledged; resynchronizing");
                self.resync(to).await
            }
        }
    }

    /// Push the full authoritative board to a remote seat
    async fn resync(&mut self, side: Side) -> Result<(), TurnFailure> {
        let sync = Packet::BoardSync(self.board.clone());
        let Seat::Remote { conn, .. } = &mut self.seat_mut(side).seat else {
            return Ok(());
        };

        match acknowledge(conn, &sync).await {
            Ok(()) => {
                self.status(format!("Resynchronized {} board", side));
                Ok(())
            }
            Err(e) if e.is_timeout() => Err(TurnFailure {
                reason: EndReason::ProtocolTimeout,
            }),
            Err(_) => Err(TurnFailure {
                reason: EndReason::Disconnected,
            }),
        }
    }

    fn result(&self, winner: Option<Side>, reason: EndReason) -> MatchResult {
        MatchResult {
            match_id: self.id,
            total_time_ms: self.settings.total_time_ms,
            width: self.board.width(),
            height: self.board.height(),
            white: self.white.seat.name().to_string(),
            white_remaining_ms: self.white.budget.remaining_ms(),
            black: self.black.seat.name().to_string(),
            black_remaining_ms: self.black.budget.remaining_ms(),
            winner,
            reason,
            move_pairs: self.move_pairs,
        }
    }

    /// Terminal: reset every remote peer, join local work, drop transports
    async fn release(self) {
        let grace = self.settings.finish_grace;
        for state in [self.white, self.black] {
            match state.seat {
                Seat::Remote { mut conn, .. } => {
                    conn.notify(&Packet::Reset).await;
                    conn.close().await;
                }
                Seat::Local(mut adapter) => {
                    let detached = adapter.finish(grace).await;
                    if detached > 0 {
                        warn!(player = %adapter.name(), detached, "Player work still running after match");
                    }
                }
            }
        }
    }
}

/// Request/ack exchange that tolerates a wrong acknowledgment.
///
/// A mismatched or malformed ack is logged and play proceeds; timeouts and
/// transport failures are returned.
async fn acknowledge<S>(conn: &mut PeerConnection<S>, packet: &Packet) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match conn.request_ack(packet).await {
        Err(e) if e.is_format_error() => {
            warn!(side = %conn.side(), error = %e, "Bad acknowledgment for {}; continuing", packet.opcode());
            Ok(())
        }
        other => other,
    }
}

fn reason_for(signal: MoveSignal) -> EndReason {
    match signal {
        MoveSignal::Forfeit => EndReason::Forfeit,
        MoveSignal::TimeExceeded => EndReason::TimeExceeded,
        MoveSignal::Error => EndReason::PlayerError,
    }
}

/// Addresses and player identifiers for a networked match
#[derive(Debug, Clone)]
pub struct RemoteMatch {
    pub white_addr: String,
    pub white_player: String,
    pub black_addr: String,
    pub black_player: String,
    pub connect_timeout: Duration,
}

/// Connecting: reach both player clients, then run the match.
///
/// A connection failure voids the match.
pub async fn run_remote_match(
    settings: MatchSettings,
    remote: RemoteMatch,
    sink: Arc<dyn DisplaySink>,
) -> MatchOutcome {
    let wire = WireConfig::for_referee(settings.protocol_timeout);
    let white = connection::connect(&remote.white_addr, Side::White, remote.connect_timeout, wire.clone()).await;
    let black = connection::connect(&remote.black_addr, Side::Black, remote.connect_timeout, wire).await;

    let (white, black) = match (white, black) {
        (Ok(white), Ok(black)) => (white, black),
        (white, black) => {
            let reason = [white.err(), black.err()]
                .into_iter()
                .flatten()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            sink.status(&format!("Match aborted: {}", reason));
            return MatchOutcome::Aborted { reason };
        }
    };

    let coordinator = TurnCoordinator::new(
        settings,
        Seat::remote(remote.white_player, white),
        Seat::remote(remote.black_player, black),
        Arc::clone(&sink),
    );
    match coordinator {
        Ok(coordinator) => coordinator.run().await,
        Err(e) => {
            let reason = e.to_string();
            sink.status(&format!("Match aborted: {}", reason));
            MatchOutcome::Aborted { reason }
        }
    }
}
