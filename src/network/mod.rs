pub mod client;
pub mod connection;
pub mod coordinator;
pub mod server;

pub use client::{PlayerClient, SessionEnd};
pub use connection::{connect, ConnectionError, PeerConnection};
pub use coordinator::{run_remote_match, MatchSettings, RemoteMatch, Seat, TurnCoordinator};
pub use server::PlayerServer;

/// Default listening port for the White player client
pub const WHITE_PORT: u16 = 2222;
/// Default listening port for the Black player client
pub const BLACK_PORT: u16 = 2223;
