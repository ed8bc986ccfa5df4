//! Common test utilities and helper modules
//!
//! Shared by every integration test file: mock transports, scripted players
//! and a status sink that records what a match reported.

#![allow(dead_code)]

pub mod mock_streams;
pub mod test_players;

use konane::game::DisplaySink;
use std::sync::Mutex;

/// Keeps every status line so tests can assert on the match narrative
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl DisplaySink for RecordingSink {
    fn status(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}
