use super::client::{PlayerClient, SessionEnd};
use crate::board::Side;
use crate::game::PlayerRegistry;
use crate::messages::wire::WireConfig;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

/// Listens on one side's port and serves referees one at a time
pub struct PlayerServer {
    side: Side,
    listener: TcpListener,
    registry: Arc<PlayerRegistry>,
    wire_config: WireConfig,
}

impl PlayerServer {
    pub async fn bind(addr: &str, side: Side, registry: Arc<PlayerRegistry>) -> Result<Self> {
        Self::bind_with_config(addr, side, registry, WireConfig::for_client()).await
    }

    /// Create a server with custom wire configuration
    pub async fn bind_with_config(
        addr: &str,
        side: Side,
        registry: Arc<PlayerRegistry>,
        wire_config: WireConfig,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {} player server to address: {}", side, addr))?;

        info!("{} player server bound to {}", side, addr);
        Ok(Self {
            side,
            listener,
            registry,
            wire_config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read listener address")
    }

    /// Accept a single referee and serve it until the session ends
    #[instrument(skip(self), fields(side = %self.side))]
    pub async fn serve_one(&self) -> Result<SessionEnd> {
        let (stream, peer_addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept referee connection")?;
        info!("Accepted referee from {}", peer_addr);
        stream.set_nodelay(true).ok();

        let mut client = PlayerClient::new(self.side, Arc::clone(&self.registry));
        let end = client
            .run(stream, self.wire_config.clone())
            .await
            .with_context(|| format!("Session with {} failed", peer_addr))?;
        info!("Session with {} ended: {:?}", peer_addr, end);
        Ok(end)
    }

    /// Serve referees back to back until the process is stopped
    pub async fn run(self) -> Result<()> {
        info!("Starting {} player server on {:?}", self.side, self.local_addr()?);
        loop {
            if let Err(e) = self.serve_one().await {
                // One bad referee should not take the player offline
                error!("{:#}", e);
            }
        }
    }
}
