pub mod packet;
pub mod wire;

pub use packet::{
    Framing, Opcode, Packet, PacketError, TurnReply, MAX_NAME_LEN, MAX_PACKET_SIZE,
};
pub use wire::{
    PacketStream, WireConfig, WireProtocolError, CLIENT_IDLE_TIMEOUT, DEFAULT_PROTOCOL_TIMEOUT,
    DEFAULT_WRITE_TIMEOUT,
};
