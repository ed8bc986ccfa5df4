use crate::messages::packet::{Framing, Opcode, Packet, PacketError, MAX_PACKET_SIZE};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, instrument, trace, warn};

// Wire protocol constants
pub const DEFAULT_PROTOCOL_TIMEOUT: Duration = Duration::from_millis(22_222);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

// Client-side waits between matches are much longer than a single turn
pub const CLIENT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Configuration for wire protocol operations
#[derive(Debug, Clone)]
pub struct WireConfig {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_PROTOCOL_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl WireConfig {
    pub fn new(read_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            read_timeout,
            write_timeout,
        }
    }

    /// Create a WireConfig with a single timeout for both read and write operations
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            read_timeout: timeout,
            write_timeout: timeout,
        }
    }

    /// Referee side: every read is bounded by the protocol timeout
    pub fn for_referee(protocol_timeout: Duration) -> Self {
        Self {
            read_timeout: protocol_timeout,
            write_timeout: protocol_timeout,
        }
    }

    /// Player client side: waits patiently for the referee between requests
    pub fn for_client() -> Self {
        Self {
            read_timeout: CLIENT_IDLE_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// Custom error types for wire protocol operations
#[derive(Error, Debug)]
pub enum WireProtocolError {
    #[error("Read operation timed out after {timeout:?}")]
    ReadTimeout { timeout: Duration },

    #[error("Write operation timed out after {timeout:?}")]
    WriteTimeout { timeout: Duration },

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Malformed packet: {0}")]
    Format(#[from] PacketError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WireProtocolError {
    /// Whether the transport itself is gone, as opposed to one bad packet or a slow peer
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            WireProtocolError::ConnectionClosed | WireProtocolError::Io(_)
        )
    }
}

/// Packet framing over a byte stream.
///
/// Each read pulls one transport segment. Fixed-size packets take exactly their
/// length and leave any surplus buffered for the next read; packets ending in a
/// name or comment take the remainder of the segment.
pub struct PacketStream<S> {
    stream: S,
    buffer: Vec<u8>,
    config: WireConfig,
}

impl<S> PacketStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: WireConfig) -> Self {
        Self {
            stream,
            buffer: Vec::with_capacity(MAX_PACKET_SIZE),
            config,
        }
    }

    pub fn config(&self) -> &WireConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Send a packet using the configured write timeout
    #[instrument(level = "debug", skip(self, packet), fields(opcode = %packet.opcode()))]
    pub async fn send(&mut self, packet: &Packet) -> Result<(), WireProtocolError> {
        let bytes = packet.encode();
        let timeout = self.config.write_timeout;
        trace!("Writing {} byte packet", bytes.len());

        let write = async {
            self.stream.write_all(&bytes).await?;
            self.stream.flush().await?;
            Ok::<(), std::io::Error>(())
        };

        match tokio::time::timeout(timeout, write).await {
            Ok(result) => {
                result?;
                debug!("Sent {} byte packet", bytes.len());
                Ok(())
            }
            Err(_elapsed) => {
                error!(timeout = ?timeout, "Write operation timed out");
                Err(WireProtocolError::WriteTimeout { timeout })
            }
        }
    }

    /// Read the next packet using the configured read timeout
    pub async fn recv(&mut self) -> Result<Packet, WireProtocolError> {
        let timeout = self.config.read_timeout;
        self.recv_with_timeout(timeout).await
    }

    /// Read the next packet, giving up after `timeout`
    #[instrument(level = "debug", skip(self), fields(timeout_ms = timeout.as_millis() as u64))]
    pub async fn recv_with_timeout(&mut self, timeout: Duration) -> Result<Packet, WireProtocolError> {
        let start_time = std::time::Instant::now();

        let outcome = tokio::time::timeout(timeout, self.read_packet()).await;
        match outcome {
            Ok(result) => {
                debug!("Timed read completed in {:?}", start_time.elapsed());
                result
            }
            Err(_elapsed) => {
                warn!(
                    timeout = ?timeout,
                    buffered = self.buffer.len(),
                    "Read operation timed out"
                );
                Err(WireProtocolError::ReadTimeout { timeout })
            }
        }
    }

    async fn read_packet(&mut self) -> Result<Packet, WireProtocolError> {
        if self.buffer.is_empty() {
            self.fill_segment(MAX_PACKET_SIZE).await?;
        }

        let opcode = match Opcode::from_byte(self.buffer[0]) {
            Ok(opcode) => opcode,
            Err(e) => {
                // Nothing in this segment can be trusted once the opcode is bad
                warn!(segment = ?self.buffer, "Dropping segment with unknown opcode");
                self.buffer.clear();
                return Err(e.into());
            }
        };

        let length = match opcode.framing() {
            Framing::Fixed(length) => {
                self.fill_to(length).await?;
                length
            }
            Framing::Trailing { min } => {
                self.fill_to(min).await?;
                self.buffer.len().min(MAX_PACKET_SIZE)
            }
            Framing::BoardSync => {
                self.fill_to(3).await?;
                let length = 3 + self.buffer[1] as usize * self.buffer[2] as usize;
                self.fill_to(length).await?;
                length
            }
        };

        let bytes: Vec<u8> = self.buffer.drain(..length).collect();
        trace!(opcode = %opcode, length, remaining = self.buffer.len(), "Framed packet");
        Packet::decode(&bytes).map_err(|e| {
            warn!(error = %e, "Failed to decode packet");
            WireProtocolError::Format(e)
        })
    }

    /// Keep reading segments until at least `length` bytes are buffered
    async fn fill_to(&mut self, length: usize) -> Result<(), WireProtocolError> {
        while self.buffer.len() < length {
            let wanted = (length - self.buffer.len()).max(MAX_PACKET_SIZE);
            self.fill_segment(wanted).await?;
        }
        Ok(())
    }

    /// One read call, appending whatever the peer sent in that segment
    async fn fill_segment(&mut self, limit: usize) -> Result<usize, WireProtocolError> {
        let mut segment = vec![0u8; limit];
        let read = self.stream.read(&mut segment).await?;
        if read == 0 {
            debug!(buffered = self.buffer.len(), "Peer closed the stream");
            return Err(WireProtocolError::ConnectionClosed);
        }
        self.buffer.extend_from_slice(&segment[..read]);
        trace!("Read {} byte segment", read);
        Ok(read)
    }
}
