use crate::board::Side;
use crate::messages::wire::{PacketStream, WireConfig, WireProtocolError};
use crate::messages::{Opcode, Packet, TurnReply};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

/// Connection-specific errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connecting to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("Wire protocol error: {0}")]
    Wire(#[from] WireProtocolError),

    #[error("Expected {expected} but peer sent {actual}")]
    UnexpectedPacket { expected: Opcode, actual: Opcode },

    #[error("Peer sent disconnect")]
    Disconnected,
}

impl ConnectionError {
    /// Peer is unreachable or gone
    pub fn is_transport_failure(&self) -> bool {
        match self {
            ConnectionError::Connect { .. }
            | ConnectionError::ConnectTimeout { .. }
            | ConnectionError::Disconnected => true,
            ConnectionError::Wire(e) => e.is_transport_failure(),
            ConnectionError::UnexpectedPacket { .. } => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ConnectionError::Wire(
                WireProtocolError::ReadTimeout { .. } | WireProtocolError::WriteTimeout { .. }
            )
        )
    }

    /// A malformed packet or the wrong acknowledgment
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ConnectionError::UnexpectedPacket { .. }
                | ConnectionError::Wire(WireProtocolError::Format(_))
        )
    }
}

/// The referee's end of a link to one player client
pub struct PeerConnection<S = TcpStream> {
    side: Side,
    stream: PacketStream<S>,
}

impl<S> PeerConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(side: Side, stream: S, wire_config: WireConfig) -> Self {
        Self {
            side,
            stream: PacketStream::new(stream, wire_config),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn read_timeout(&self) -> Duration {
        self.stream.config().read_timeout
    }

    pub async fn send(&mut self, packet: &Packet) -> Result<(), ConnectionError> {
        self.stream.send(packet).await?;
        Ok(())
    }

    /// Next packet from the peer; a disconnect packet is reported as an error
    pub async fn recv_with_timeout(&mut self, timeout: Duration) -> Result<Packet, ConnectionError> {
        match self.stream.recv_with_timeout(timeout).await? {
            Packet::Disconnect => {
                info!(side = %self.side, "Peer sent disconnect");
                Err(ConnectionError::Disconnected)
            }
            packet => Ok(packet),
        }
    }

    /// Send a request and wait for its acknowledgment
    #[instrument(level = "debug", skip(self, packet), fields(side = %self.side, opcode = %packet.opcode()))]
    pub async fn request_ack(&mut self, packet: &Packet) -> Result<(), ConnectionError> {
        self.send(packet).await?;
        let Some(expected) = packet.opcode().ack() else {
            return Ok(());
        };

        let reply = self.recv_with_timeout(self.read_timeout()).await?;
        if reply.opcode() != expected {
            return Err(ConnectionError::UnexpectedPacket {
                expected,
                actual: reply.opcode(),
            });
        }
        debug!("Received {}", expected);
        Ok(())
    }

    /// Send begin-turn and wait up to `timeout` for the player's move.
    ///
    /// Bare acknowledgments left over from earlier requests are skipped.
    #[instrument(level = "debug", skip(self), fields(side = %self.side))]
    pub async fn request_move(&mut self, timeout: Duration) -> Result<TurnReply, ConnectionError> {
        let deadline = Instant::now() + timeout;
        self.send(&Packet::BeginTurn).await?;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.recv_with_timeout(remaining).await? {
                Packet::BeginTurnAck(reply) => return Ok(reply),
                stale @ (Packet::NameAck
                | Packet::TimeAck
                | Packet::EndTurnAck
                | Packet::BoardAck
                | Packet::BoardSyncAck
                | Packet::MoveAck) => {
                    debug!(opcode = %stale.opcode(), "Skipping stale acknowledgment");
                }
                other => {
                    return Err(ConnectionError::UnexpectedPacket {
                        expected: Opcode::BeginTurnAck,
                        actual: other.opcode(),
                    })
                }
            }
        }
    }

    /// Best-effort send that only logs failures
    pub async fn notify(&mut self, packet: &Packet) {
        if let Err(e) = self.send(packet).await {
            debug!(side = %self.side, error = %e, "Could not deliver {}", packet.opcode());
        }
    }

    /// Shut down the write half and drop the transport
    pub async fn close(self) {
        let mut stream = self.stream.into_inner();
        if let Err(e) = stream.shutdown().await {
            debug!(error = %e, "Error shutting down peer stream");
        }
    }
}

/// Open a TCP connection to a player client
#[instrument(skip(wire_config))]
pub async fn connect(
    addr: &str,
    side: Side,
    connect_timeout: Duration,
    wire_config: WireConfig,
) -> Result<PeerConnection<TcpStream>, ConnectionError> {
    info!("Connecting to {} player at {}", side, addr);

    let stream = match tokio::time::timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => {
            warn!(error = %source, "Connection to {} failed", addr);
            return Err(ConnectionError::Connect {
                addr: addr.to_string(),
                source,
            });
        }
        Err(_) => {
            warn!("Connection to {} timed out", addr);
            return Err(ConnectionError::ConnectTimeout {
                addr: addr.to_string(),
                timeout: connect_timeout,
            });
        }
    };

    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "Could not disable Nagle on {}", addr);
    }
    info!("Connected to {} player at {}", side, addr);
    Ok(PeerConnection::new(side, stream, wire_config))
}
