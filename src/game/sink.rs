//! Destinations for human-readable match status lines

use std::io::{self, Write};
use tokio::sync::mpsc;
use tracing::info;

/// Receives one status line per match transition
pub trait DisplaySink: Send + Sync {
    fn status(&self, line: &str);
}

/// Prints status lines to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl DisplaySink for ConsoleSink {
    fn status(&self, line: &str) {
        let mut stdout = io::stdout().lock();
        // A closed stdout should not bring down a match
        let _ = writeln!(stdout, "{}", line);
    }
}

/// Routes status lines through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DisplaySink for TracingSink {
    fn status(&self, line: &str) {
        for part in line.lines() {
            info!(target: "konane::status", "{}", part);
        }
    }
}

/// Forwards status lines over a channel to whoever renders them
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DisplaySink for ChannelSink {
    fn status(&self, line: &str) {
        // Receiver gone means nobody is watching anymore
        let _ = self.tx.send(line.to_string());
    }
}
