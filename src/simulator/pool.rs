use super::pairings::{Pairing, Pairings};
use super::simulator::Simulator;
use crate::game::{DisplaySink, MatchResult, PlayerRegistry};
use crate::network::MatchSettings;
use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, instrument};

/// How pool games are set up
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub games_per_pair: usize,
    /// Board width and height are each drawn from this range per game
    pub dimensions: RangeInclusive<usize>,
    pub total_time_ms: i64,
    pub protocol_timeout: Duration,
    pub verbose: bool,
    /// Fixed seed for reproducible board sizes
    pub seed: Option<u64>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            games_per_pair: 3,
            dimensions: 7..=11,
            total_time_ms: 120_000,
            protocol_timeout: crate::messages::DEFAULT_PROTOCOL_TIMEOUT,
            verbose: false,
            seed: None,
        }
    }
}

/// Round-robin runner: every pairing plays several games with alternating colours
pub struct Pool {
    settings: PoolSettings,
    registry: Arc<PlayerRegistry>,
    sink: Arc<dyn DisplaySink>,
    rng: Mutex<StdRng>,
}

impl Pool {
    pub fn new(settings: PoolSettings, registry: Arc<PlayerRegistry>, sink: Arc<dyn DisplaySink>) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            settings,
            registry,
            sink,
            rng: Mutex::new(rng),
        }
    }

    fn dimension(&self) -> usize {
        let range = self.settings.dimensions.clone();
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(range),
            // Poisoned only if a previous draw panicked; fall back to the low end
            Err(_) => *range.start(),
        }
    }

    /// Play every pairing; results come back in play order
    pub async fn run(&self, pairings: &Pairings) -> Result<Vec<MatchResult>> {
        let unknown: Vec<&str> = pairings
            .iter()
            .flat_map(|pair| [pair.first.as_str(), pair.second.as_str()])
            .filter(|name| !self.registry.contains(name))
            .collect();
        if !unknown.is_empty() {
            bail!(
                "Unknown players in pairings: {} (available: {})",
                unknown.join(", "),
                self.registry.names().join(", ")
            );
        }

        let mut results = Vec::new();
        for pairing in pairings.iter() {
            results.extend(self.play_pair(pairing).await?);
        }
        info!(games = results.len(), "Pool complete");
        Ok(results)
    }

    /// Games with an odd index swap colours
    #[instrument(skip(self), fields(first = %pairing.first, second = %pairing.second))]
    pub async fn play_pair(&self, pairing: &Pairing) -> Result<Vec<MatchResult>> {
        let mut results = Vec::with_capacity(self.settings.games_per_pair);

        for game in 0..self.settings.games_per_pair {
            let (white, black) = if game % 2 == 1 {
                (&pairing.second, &pairing.first)
            } else {
                (&pairing.first, &pairing.second)
            };

            self.sink.status("------------- New Game -------------");
            let settings = MatchSettings::new(self.dimension(), self.dimension(), self.settings.total_time_ms)
                .with_protocol_timeout(self.settings.protocol_timeout)
                .with_verbose(self.settings.verbose);
            let simulator = Simulator::new(
                settings,
                white.clone(),
                black.clone(),
                Arc::clone(&self.registry),
                Arc::clone(&self.sink),
            );
            results.push(simulator.play().await?);
        }

        self.sink.status("----------- Head-to-Head Results ------------");
        for result in &results {
            self.sink.status(&result.to_string());
        }
        Ok(results)
    }
}
