//! Obol node entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod node;

use config::NodeConfig;
use node::Node;

/// Obol proof-of-stake node.
#[derive(Parser, Debug)]
#[command(name = "obol-node")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "obol-node.toml")]
    config: PathBuf,

    /// Network to connect to (mainnet, testnet, regtest)
    #[arg(short, long)]
    network: Option<String>,

    /// Data directory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Enable the stake minter
    #[arg(long)]
    minting: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = NodeConfig::load(&args.config)?;
    if let Some(network) = args.network {
        config.network = network;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if args.minting {
        config.minting.enabled = true;
    }

    let params = config.consensus_params()?;
    info!(
        node = config.node_name,
        network = params.network.name(),
        data_dir = %config.data_dir.display(),
        "starting obol node"
    );

    let node = Node::new(params);

    if config.minting.enabled {
        // the minter needs a wallet backend for coinstake search and
        // block signing; without one configured it stays off
        warn!("minting enabled but no wallet backend is configured; minter not started");
    } else {
        info!("proof-of-stake minter disabled");
    }

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    node.shutdown();

    Ok(())
}
