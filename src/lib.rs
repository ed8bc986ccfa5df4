pub mod board;
pub mod cli;
pub mod game;
pub mod messages;
pub mod network;
pub mod simulator;

// Re-export key types for easy testing
pub use board::{Board, BoardError, Move, MoveSignal, Position, Side};
pub use game::{MatchOutcome, MatchResult, Player, PlayerAdapter, PlayerRegistry, TimeBudget};
pub use messages::{Packet, PacketStream};
pub use network::{PlayerClient, TurnCoordinator};
