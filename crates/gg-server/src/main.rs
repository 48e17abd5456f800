//! Gadgets control engine
//!
//! Usage: `gadgets [config.yaml]`

use anyhow::Result;
use gg_config::SystemConfig;
use gg_server::{build_actors, System};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "gadgets.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = SystemConfig::load(&path)?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(config = %path, gadgets = config.gadgets.len(), "Starting gadgets");

    let actors = build_actors(&config)?;
    let system = System::start(config.bus.capacity, actors);

    info!("Gadgets running");
    tokio::signal::ctrl_c().await?;

    system.shutdown().await;
    info!("Stopped");
    Ok(())
}
