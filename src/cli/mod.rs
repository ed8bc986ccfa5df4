pub mod app;
pub mod commands;
pub mod display;

pub use app::{App, Config};
pub use commands::{Cli, Commands};
pub use display::{display_players, display_standings, standings, Standing};
