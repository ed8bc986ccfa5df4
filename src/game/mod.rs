pub mod adapter;
pub mod budget;
pub mod player;
pub mod players;
pub mod registry;
pub mod result;
pub mod sink;

pub use adapter::{PlayerAdapter, TurnOutcome};
pub use budget::TimeBudget;
pub use player::{Player, TurnContext};
pub use players::{FirstMovePlayer, GreedyPlayer, RandomPlayer};
pub use registry::{PlayerFactory, PlayerRegistry, RegistryError};
pub use result::{EndReason, MatchOutcome, MatchResult};
pub use sink::{ChannelSink, ConsoleSink, DisplaySink, TracingSink};
