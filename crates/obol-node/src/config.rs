//! Node configuration.

use anyhow::{bail, Context, Result};
use obol_consensus::ConsensusParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node name, for logs.
    #[serde(default = "default_node_name")]
    pub node_name: String,
    /// Network (mainnet, testnet, regtest).
    #[serde(default = "default_network")]
    pub network: String,
    /// Data directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Minting configuration.
    #[serde(default)]
    pub minting: MintingConfig,
}

fn default_node_name() -> String {
    "obol-node".to_string()
}

fn default_network() -> String {
    "mainnet".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".obol")
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            node_name: default_node_name(),
            network: default_network(),
            data_dir: default_data_dir(),
            minting: MintingConfig::default(),
        }
    }
}

/// Minting configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MintingConfig {
    /// Enable the stake minter.
    #[serde(default)]
    pub enabled: bool,
}

impl NodeConfig {
    /// Load from a TOML file; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(NodeConfig::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Consensus parameters for the configured network.
    pub fn consensus_params(&self) -> Result<ConsensusParams> {
        match self.network.as_str() {
            "mainnet" => Ok(ConsensusParams::mainnet()),
            "testnet" => Ok(ConsensusParams::testnet()),
            "regtest" => Ok(ConsensusParams::regtest()),
            other => bail!("unknown network '{other}'"),
        }
    }
}
