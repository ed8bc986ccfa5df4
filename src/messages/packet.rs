//! Fixed-layout packets exchanged between the referee and a player client
//!
//! Every packet starts with a one-byte opcode. Structural fields are single
//! bytes (or an 8-byte big-endian time value); the name and comment fields
//! have no length prefix and run to the end of the segment.

use crate::board::side::{cell_from_byte, cell_to_byte};
use crate::board::{Board, BoardError, Move, Position, Side, MAX_COMMENT_LEN};
use std::fmt;
use thiserror::Error;

/// Opcode byte plus the five move fields plus the longest comment
pub const MAX_PACKET_SIZE: usize = 1 + 5 + MAX_COMMENT_LEN;
/// Longest name that fits in a single packet
pub const MAX_NAME_LEN: usize = MAX_PACKET_SIZE - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Name = 0,
    NameAck = 1,
    Time = 2,
    TimeAck = 3,
    BeginTurn = 4,
    BeginTurnAck = 5,
    EndTurn = 6,
    EndTurnAck = 7,
    Board = 8,
    BoardAck = 9,
    BoardSync = 10,
    BoardSyncAck = 11,
    Move = 12,
    MoveAck = 13,
    Disconnect = 14,
    Reset = 15,
}

/// How many bytes a packet occupies once its opcode is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Exactly this many bytes, opcode included
    Fixed(usize),
    /// At least `min` bytes; the rest of the segment is a trailing string
    Trailing { min: usize },
    /// Opcode, width, height, then width x height tokens
    BoardSync,
}

impl Opcode {
    pub fn from_byte(byte: u8) -> Result<Self, PacketError> {
        let opcode = match byte {
            0 => Opcode::Name,
            1 => Opcode::NameAck,
            2 => Opcode::Time,
            3 => Opcode::TimeAck,
            4 => Opcode::BeginTurn,
            5 => Opcode::BeginTurnAck,
            6 => Opcode::EndTurn,
            7 => Opcode::EndTurnAck,
            8 => Opcode::Board,
            9 => Opcode::BoardAck,
            10 => Opcode::BoardSync,
            11 => Opcode::BoardSyncAck,
            12 => Opcode::Move,
            13 => Opcode::MoveAck,
            14 => Opcode::Disconnect,
            15 => Opcode::Reset,
            other => return Err(PacketError::UnknownOpcode(other)),
        };
        Ok(opcode)
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn framing(self) -> Framing {
        match self {
            Opcode::Name => Framing::Trailing { min: 1 },
            Opcode::Time => Framing::Fixed(9),
            Opcode::BeginTurnAck => Framing::Trailing { min: 5 },
            Opcode::Board => Framing::Fixed(3),
            Opcode::BoardSync => Framing::BoardSync,
            Opcode::Move => Framing::Trailing { min: 6 },
            _ => Framing::Fixed(1),
        }
    }

    /// The acknowledgment a receiver answers this request with
    pub fn ack(self) -> Option<Opcode> {
        match self {
            Opcode::Name => Some(Opcode::NameAck),
            Opcode::Time => Some(Opcode::TimeAck),
            Opcode::BeginTurn => Some(Opcode::BeginTurnAck),
            Opcode::EndTurn => Some(Opcode::EndTurnAck),
            Opcode::Board => Some(Opcode::BoardAck),
            Opcode::BoardSync => Some(Opcode::BoardSyncAck),
            Opcode::Move => Some(Opcode::MoveAck),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.as_byte())
    }
}

/// Malformed or undersized packet
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Empty segment")]
    Empty,

    #[error("Unknown opcode: {0}")]
    UnknownOpcode(u8),

    #[error("Truncated {opcode} packet: need {expected} bytes, got {actual}")]
    Truncated {
        opcode: Opcode,
        expected: usize,
        actual: usize,
    },

    #[error("Unexpected {extra} trailing bytes after {opcode} packet")]
    TrailingBytes { opcode: Opcode, extra: usize },

    #[error("Invalid field in {opcode} packet: {source}")]
    InvalidField {
        opcode: Opcode,
        #[source]
        source: BoardError,
    },
}

/// A move as reported in a begin-turn acknowledgment, before the referee
/// attributes it to the side whose turn it is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub from: Position,
    pub to: Position,
    pub comment: String,
}

impl TurnReply {
    pub fn into_move(self, side: Side) -> Move {
        Move::new(self.from, self.to, side, self.comment)
    }
}

impl From<&Move> for TurnReply {
    fn from(mv: &Move) -> Self {
        Self {
            from: mv.from(),
            to: mv.to(),
            comment: mv.comment().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Name(String),
    NameAck,
    /// Total time budget in milliseconds
    Time(i64),
    TimeAck,
    BeginTurn,
    BeginTurnAck(TurnReply),
    EndTurn,
    EndTurnAck,
    Board { width: u8, height: u8 },
    BoardAck,
    BoardSync(Board),
    BoardSyncAck,
    Move(Move),
    MoveAck,
    Disconnect,
    Reset,
}

impl Packet {
    pub fn opcode(&self) -> Opcode {
        match self {
            Packet::Name(_) => Opcode::Name,
            Packet::NameAck => Opcode::NameAck,
            Packet::Time(_) => Opcode::Time,
            Packet::TimeAck => Opcode::TimeAck,
            Packet::BeginTurn => Opcode::BeginTurn,
            Packet::BeginTurnAck(_) => Opcode::BeginTurnAck,
            Packet::EndTurn => Opcode::EndTurn,
            Packet::EndTurnAck => Opcode::EndTurnAck,
            Packet::Board { .. } => Opcode::Board,
            Packet::BoardAck => Opcode::BoardAck,
            Packet::BoardSync(_) => Opcode::BoardSync,
            Packet::BoardSyncAck => Opcode::BoardSyncAck,
            Packet::Move(_) => Opcode::Move,
            Packet::MoveAck => Opcode::MoveAck,
            Packet::Disconnect => Opcode::Disconnect,
            Packet::Reset => Opcode::Reset,
        }
    }

    /// Bare acknowledgment packet for an ack opcode
    pub fn ack_for(request: Opcode) -> Option<Packet> {
        match request.ack()? {
            Opcode::NameAck => Some(Packet::NameAck),
            Opcode::TimeAck => Some(Packet::TimeAck),
            Opcode::EndTurnAck => Some(Packet::EndTurnAck),
            Opcode::BoardAck => Some(Packet::BoardAck),
            Opcode::BoardSyncAck => Some(Packet::BoardSyncAck),
            Opcode::MoveAck => Some(Packet::MoveAck),
            // Begin-turn is answered with a move, never a bare ack
            _ => None,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![self.opcode().as_byte()];
        match self {
            Packet::Name(name) => {
                bytes.extend(name.bytes().take(MAX_NAME_LEN));
            }
            Packet::Time(millis) => bytes.extend_from_slice(&millis.to_be_bytes()),
            Packet::BeginTurnAck(reply) => {
                bytes.extend_from_slice(&[
                    reply.from.col,
                    reply.from.row,
                    reply.to.col,
                    reply.to.row,
                ]);
                bytes.extend(reply.comment.bytes().take(MAX_COMMENT_LEN));
            }
            Packet::Board { width, height } => bytes.extend_from_slice(&[*width, *height]),
            Packet::BoardSync(board) => {
                bytes.push(board.width());
                bytes.push(board.height());
                bytes.extend(board.cells().iter().map(|cell| cell_to_byte(*cell)));
            }
            Packet::Move(mv) => {
                bytes.extend_from_slice(&[
                    mv.from().col,
                    mv.from().row,
                    mv.to().col,
                    mv.to().row,
                    mv.side().to_byte(),
                ]);
                bytes.extend(mv.comment().bytes().take(MAX_COMMENT_LEN));
            }
            _ => {}
        }
        bytes
    }

    /// Decode one complete packet
    pub fn decode(bytes: &[u8]) -> Result<Packet, PacketError> {
        let (&first, payload) = bytes.split_first().ok_or(PacketError::Empty)?;
        let opcode = Opcode::from_byte(first)?;

        let need = |expected: usize| -> Result<(), PacketError> {
            if bytes.len() < expected {
                Err(PacketError::Truncated {
                    opcode,
                    expected,
                    actual: bytes.len(),
                })
            } else {
                Ok(())
            }
        };

        match opcode.framing() {
            Framing::Fixed(len) => {
                need(len)?;
                if bytes.len() > len {
                    return Err(PacketError::TrailingBytes {
                        opcode,
                        extra: bytes.len() - len,
                    });
                }
            }
            Framing::Trailing { min } => need(min)?,
            Framing::BoardSync => need(3)?,
        }

        let packet = match opcode {
            Opcode::Name => Packet::Name(String::from_utf8_lossy(payload).into_owned()),
            Opcode::NameAck => Packet::NameAck,
            Opcode::Time => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&payload[..8]);
                Packet::Time(i64::from_be_bytes(raw))
            }
            Opcode::TimeAck => Packet::TimeAck,
            Opcode::BeginTurn => Packet::BeginTurn,
            Opcode::BeginTurnAck => Packet::BeginTurnAck(TurnReply {
                from: Position::new(payload[0], payload[1]),
                to: Position::new(payload[2], payload[3]),
                comment: String::from_utf8_lossy(&payload[4..]).into_owned(),
            }),
            Opcode::EndTurn => Packet::EndTurn,
            Opcode::EndTurnAck => Packet::EndTurnAck,
            Opcode::Board => Packet::Board {
                width: payload[0],
                height: payload[1],
            },
            Opcode::BoardAck => Packet::BoardAck,
            Opcode::BoardSync => {
                let (width, height) = (payload[0], payload[1]);
                let expected = 3 + width as usize * height as usize;
                need(expected)?;
                if bytes.len() > expected {
                    return Err(PacketError::TrailingBytes {
                        opcode,
                        extra: bytes.len() - expected,
                    });
                }
                let invalid = |source| PacketError::InvalidField { opcode, source };
                let cells = payload[2..]
                    .iter()
                    .map(|byte| cell_from_byte(*byte))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(invalid)?;
                Packet::BoardSync(Board::from_tokens(width, height, cells).map_err(invalid)?)
            }
            Opcode::BoardSyncAck => Packet::BoardSyncAck,
            Opcode::Move => {
                let side = Side::from_byte(payload[4])
                    .map_err(|source| PacketError::InvalidField { opcode, source })?;
                Packet::Move(Move::new(
                    Position::new(payload[0], payload[1]),
                    Position::new(payload[2], payload[3]),
                    side,
                    String::from_utf8_lossy(&payload[5..]),
                ))
            }
            Opcode::MoveAck => Packet::MoveAck,
            Opcode::Disconnect => Packet::Disconnect,
            Opcode::Reset => Packet::Reset,
        };
        Ok(packet)
    }
}
