use crate::board::{Side, MAX_DIMENSION};
use crate::cli::commands::Commands;
use crate::cli::display;
use crate::game::{ConsoleSink, DisplaySink, PlayerRegistry, TracingSink};
use crate::messages::WireConfig;
use crate::network::{self, MatchSettings, PlayerServer, RemoteMatch};
use crate::simulator::{Pairings, Pool, PoolSettings, Simulator};
use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host the player client binds and the referee connects to
    pub host: String,
    pub white_port: u16,
    pub black_port: u16,
    /// Bound on every referee read from a player client
    pub protocol_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// How long a player client waits for the referee's next request
    pub idle_timeout_ms: u64,
    /// Surface rule-violation diagnostics
    pub verbose: bool,
    pub default_time_ms: i64,
    pub default_width: usize,
    pub default_height: usize,
    pub games_per_pair: usize,
    pub min_dimension: usize,
    pub max_dimension: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            white_port: network::WHITE_PORT,
            black_port: network::BLACK_PORT,
            protocol_timeout_ms: 22_222,
            connect_timeout_ms: 10_000,
            idle_timeout_ms: 600_000,
            verbose: true,
            default_time_ms: 120_000,
            default_width: 8,
            default_height: 8,
            games_per_pair: 3,
            min_dimension: 7,
            max_dimension: 11,
        }
    }
}

impl Config {
    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        ProjectDirs::from("dev", "konane", "konane")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    /// Get the default config file path
    pub fn default_config_file() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Load from an explicit path, or from the default location if it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from(path)?,
            None => match Self::default_config_file() {
                Ok(file) if file.exists() => Self::load_from(&file)?,
                Ok(_) | Err(_) => Config::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path, content).context("Failed to write configuration file")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.white_port == self.black_port {
            bail!("White and Black ports must differ (both are {})", self.white_port);
        }
        if self.min_dimension < 2 || self.max_dimension > MAX_DIMENSION as usize {
            bail!(
                "Pool board sizes must lie within 2..={}, got {}..={}",
                MAX_DIMENSION,
                self.min_dimension,
                self.max_dimension
            );
        }
        if self.min_dimension > self.max_dimension {
            bail!(
                "min_dimension ({}) exceeds max_dimension ({})",
                self.min_dimension,
                self.max_dimension
            );
        }
        if self.games_per_pair == 0 {
            bail!("games_per_pair must be at least 1");
        }
        Ok(())
    }

    pub fn protocol_timeout(&self) -> Duration {
        Duration::from_millis(self.protocol_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn port_for(&self, side: Side) -> u16 {
        match side {
            Side::White => self.white_port,
            Side::Black => self.black_port,
        }
    }

    pub fn match_settings(&self, width: usize, height: usize, total_time_ms: i64) -> MatchSettings {
        MatchSettings::new(width, height, total_time_ms)
            .with_protocol_timeout(self.protocol_timeout())
            .with_verbose(self.verbose)
    }
}

/// Main application state
pub struct App {
    pub config: Config,
    pub registry: Arc<PlayerRegistry>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: Arc::new(PlayerRegistry::with_builtin()),
        }
    }

    fn sink(quiet: bool) -> Arc<dyn DisplaySink> {
        if quiet {
            Arc::new(TracingSink)
        } else {
            Arc::new(ConsoleSink)
        }
    }

    pub async fn execute(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Simulate {
                width,
                height,
                time_ms,
                white,
                black,
                json,
                quiet,
            } => {
                self.handle_simulate(width, height, time_ms, &white, &black, json, quiet)
                    .await
            }
            Commands::Pool {
                pairings,
                games,
                time_ms,
                seed,
                json,
                quiet,
            } => self.handle_pool(&pairings, games, time_ms, seed, json, quiet).await,
            Commands::Referee {
                white,
                black,
                width,
                height,
                time_ms,
                white_addr,
                black_addr,
                json,
            } => {
                let remote = RemoteMatch {
                    white_addr: white_addr
                        .unwrap_or_else(|| format!("{}:{}", self.config.host, self.config.white_port)),
                    white_player: white,
                    black_addr: black_addr
                        .unwrap_or_else(|| format!("{}:{}", self.config.host, self.config.black_port)),
                    black_player: black,
                    connect_timeout: self.config.connect_timeout(),
                };
                self.handle_referee(remote, width, height, time_ms, json).await
            }
            Commands::Client { side, bind } => self.handle_client(side, bind).await,
            Commands::Players => {
                display::display_players(&self.registry);
                Ok(())
            }
            Commands::Config { write } => self.handle_config(write),
        }
    }

    /// Handle the 'simulate' command - one local match
    #[allow(clippy::too_many_arguments)]
    pub async fn handle_simulate(
        &self,
        width: usize,
        height: usize,
        time_ms: i64,
        white: &str,
        black: &str,
        json: bool,
        quiet: bool,
    ) -> Result<()> {
        let settings = self.config.match_settings(width, height, time_ms);
        let simulator = Simulator::new(settings, white, black, Arc::clone(&self.registry), Self::sink(quiet));
        let result = simulator.play().await?;
        if json {
            println!("{}", result.to_json()?);
        }
        Ok(())
    }

    /// Handle the 'pool' command - round robin over a pairings file
    pub async fn handle_pool(
        &self,
        pairings: &Path,
        games: Option<usize>,
        time_ms: Option<i64>,
        seed: Option<u64>,
        json: bool,
        quiet: bool,
    ) -> Result<()> {
        let pairings = Pairings::from_file(pairings)?;
        if pairings.is_empty() {
            bail!("Pairings file lists no games");
        }

        let settings = PoolSettings {
            games_per_pair: games.unwrap_or(self.config.games_per_pair),
            dimensions: self.config.min_dimension..=self.config.max_dimension,
            total_time_ms: time_ms.unwrap_or(self.config.default_time_ms),
            protocol_timeout: self.config.protocol_timeout(),
            verbose: self.config.verbose,
            seed,
        };
        let pool = Pool::new(settings, Arc::clone(&self.registry), Self::sink(quiet));
        let results = pool.run(&pairings).await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else {
            display::display_standings(&results);
        }
        Ok(())
    }

    /// Handle the 'referee' command - drive a match between two player clients
    pub async fn handle_referee(
        &self,
        remote: RemoteMatch,
        width: Option<usize>,
        height: Option<usize>,
        time_ms: Option<i64>,
        json: bool,
    ) -> Result<()> {
        let settings = self.config.match_settings(
            width.unwrap_or(self.config.default_width),
            height.unwrap_or(self.config.default_height),
            time_ms.unwrap_or(self.config.default_time_ms),
        );
        let outcome = network::run_remote_match(settings, remote, Self::sink(false)).await;
        let result = match outcome.into_result() {
            Ok(result) => result,
            Err(reason) => bail!("Match aborted: {}", reason),
        };
        if json {
            println!("{}", result.to_json()?);
        }
        Ok(())
    }

    /// Handle the 'client' command - host a player on the side's port
    pub async fn handle_client(&self, side: Side, bind: Option<String>) -> Result<()> {
        let host = bind.unwrap_or_else(|| self.config.host.clone());
        let addr = format!("{}:{}", host, self.config.port_for(side));
        let wire = WireConfig::new(
            Duration::from_millis(self.config.idle_timeout_ms),
            self.config.protocol_timeout(),
        );
        let server = PlayerServer::bind_with_config(&addr, side, Arc::clone(&self.registry), wire).await?;
        info!("Hosting {} player on {}", side, addr);
        server.run().await
    }

    /// Handle the 'config' command
    pub fn handle_config(&self, write: bool) -> Result<()> {
        let path = Config::default_config_file()?;
        if write {
            self.config.save_to(&path)?;
            println!("Wrote configuration to {}", path.display());
        } else {
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(&self.config)?);
        }
        Ok(())
    }
}
