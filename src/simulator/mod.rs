pub mod pairings;
pub mod pool;
#[allow(clippy::module_inception)]
pub mod simulator;

pub use pairings::{Pairing, PairingError, Pairings};
pub use pool::{Pool, PoolSettings};
pub use simulator::Simulator;
