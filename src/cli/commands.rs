use crate::board::Side;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "konane")]
#[command(about = "Referee, player host and simulator for timed Konane matches")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play one match between two built-in players on this machine
    ///
    /// Example: konane simulate 8 8 120000 random greedy
    Simulate {
        /// Board width (clamped to 127)
        width: usize,
        /// Board height (clamped to 127)
        height: usize,
        /// Total thinking time per side, in milliseconds
        time_ms: i64,
        /// Player identifier for White
        white: String,
        /// Player identifier for Black
        black: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Send status lines to the log instead of stdout
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run a round-robin pool from a pairings file
    ///
    /// Each line of the file names two players. Every pair plays several
    /// games on random board sizes, swapping colours on the middle game.
    ///
    /// Example: konane pool pairings.txt --seed 7
    Pool {
        /// File with one `white black` pair per line
        pairings: PathBuf,
        /// Games per pairing
        #[arg(short, long)]
        games: Option<usize>,
        /// Total thinking time per side, in milliseconds
        #[arg(short, long = "time")]
        time_ms: Option<i64>,
        /// Seed for board sizes
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        json: bool,
        #[arg(short, long)]
        quiet: bool,
    },

    /// Referee a match between two running player clients
    ///
    /// Example: konane referee random greedy --width 9 --height 9
    Referee {
        /// Player the White client should load
        white: String,
        /// Player the Black client should load
        black: String,
        #[arg(long)]
        width: Option<usize>,
        #[arg(long)]
        height: Option<usize>,
        #[arg(short, long = "time")]
        time_ms: Option<i64>,
        /// White client address (defaults to host:white_port)
        #[arg(long)]
        white_addr: Option<String>,
        /// Black client address (defaults to host:black_port)
        #[arg(long)]
        black_addr: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Host a player on the port for one side and wait for referees
    ///
    /// Example: konane client --side black
    Client {
        /// Side to listen for: white or black
        #[arg(short, long)]
        side: Side,
        /// Host to bind (defaults to configured host)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// List the players this build can host
    Players,

    /// Show the effective configuration
    Config {
        /// Write it to the default config file
        #[arg(long)]
        write: bool,
    },
}
