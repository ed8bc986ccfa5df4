use crate::board::Side;
use crate::game::{DisplaySink, MatchOutcome, MatchResult, PlayerAdapter, PlayerRegistry};
use crate::network::{MatchSettings, Seat, TurnCoordinator};
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tokio::net::TcpStream;
use tracing::info;

/// Runs a match between two locally hosted players, with no network involved
pub struct Simulator {
    settings: MatchSettings,
    white: String,
    black: String,
    registry: Arc<PlayerRegistry>,
    sink: Arc<dyn DisplaySink>,
}

impl Simulator {
    pub fn new(
        settings: MatchSettings,
        white: impl Into<String>,
        black: impl Into<String>,
        registry: Arc<PlayerRegistry>,
        sink: Arc<dyn DisplaySink>,
    ) -> Self {
        Self {
            settings,
            white: white.into(),
            black: black.into(),
            registry,
            sink,
        }
    }

    fn seat(&self, side: Side, name: &str) -> Result<Seat<TcpStream>> {
        let player = self
            .registry
            .create(name)
            .with_context(|| format!("Failed to load {} player", side))?;
        Ok(Seat::Local(PlayerAdapter::new(side, player)))
    }

    /// Load both players and play one match
    pub async fn play(&self) -> Result<MatchResult> {
        let white = self.seat(Side::White, &self.white)?;
        let black = self.seat(Side::Black, &self.black)?;

        info!(white = %self.white, black = %self.black, "Simulating match");
        let coordinator = TurnCoordinator::new(
            self.settings.clone(),
            white,
            black,
            Arc::clone(&self.sink),
        )
        .context("Failed to set up board")?;

        match coordinator.run().await {
            MatchOutcome::Finished(result) => Ok(result),
            MatchOutcome::Aborted { reason } => Err(anyhow!("Match aborted: {}", reason)),
        }
    }
}
