use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use itinerary_planner::config::PlannerConfig;
use itinerary_planner::gateway::Gateways;
use itinerary_planner::{AppState, VERSION, storage, telemetry, web};

/// Smart itinerary planner backend
#[derive(Debug, Parser)]
#[command(name = "itinerary-planner", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "PLANNER_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env is optional
    dotenvy::dotenv().ok();

    let mut config = PlannerConfig::load_from_path(cli.config).context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    telemetry::init(&config.logging)?;
    info!("itinerary-planner {} starting", VERSION);

    let gateways = Gateways::from_config(&config)?;
    let store = storage::open(&config.storage).await?;
    info!("Document store: {}", store.backend());

    let state = AppState::new(gateways, store, config.policy.min_description_length);
    web::run(state, &config.bind_address()).await
}
