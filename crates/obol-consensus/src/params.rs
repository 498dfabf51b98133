//! Consensus parameters.

/// Ratio of selection-section length between the last group and the
/// first group of the modifier selection interval.
pub const MODIFIER_INTERVAL_RATIO: i64 = 3;

/// Maximum future block-time drift under the v0.9+ protocol.
pub const MAX_FUTURE_BLOCK_TIME: i64 = 15 * 60;

/// Maximum future block-time drift before the v0.9 protocol.
pub const MAX_FUTURE_BLOCK_TIME_PREV9: i64 = 2 * 60 * 60;

/// Network the node operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// Production network.
    Mainnet,
    /// Public test network.
    Testnet,
    /// Local regression-test network; every protocol era is active.
    Regtest,
}

impl Network {
    /// Lower-case network name, as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        }
    }
}

/// Network consensus parameters for the proof-of-stake core.
#[derive(Debug, Clone)]
pub struct ConsensusParams {
    /// Network id.
    pub network: Network,
    /// Stake modifier epoch length in seconds.
    pub modifier_interval: i64,
    /// Minimum coin age before an output can stake, in seconds.
    pub stake_min_age: i64,
    /// Coin-age cap in seconds.
    pub stake_max_age: i64,
    /// Target spacing between proof-of-stake blocks, in seconds.
    pub stake_target_spacing: i64,
}

impl ConsensusParams {
    /// Mainnet parameters.
    pub fn mainnet() -> Self {
        ConsensusParams {
            network: Network::Mainnet,
            modifier_interval: 6 * 60 * 60,
            stake_min_age: 30 * 24 * 60 * 60,
            stake_max_age: 90 * 24 * 60 * 60,
            stake_target_spacing: 10 * 60,
        }
    }

    /// Testnet parameters. Age and epoch parameters match mainnet so
    /// testnet exercises the same kernel arithmetic.
    pub fn testnet() -> Self {
        ConsensusParams {
            network: Network::Testnet,
            ..Self::mainnet()
        }
    }

    /// Regtest parameters: short intervals so epochs and ages are
    /// reachable in tests.
    pub fn regtest() -> Self {
        ConsensusParams {
            network: Network::Regtest,
            modifier_interval: 60 * 20,
            stake_min_age: 60 * 60,
            stake_max_age: 24 * 60 * 60,
            stake_target_spacing: 60,
        }
    }

    /// Whether this is the main network.
    pub fn is_mainnet(&self) -> bool {
        self.network == Network::Mainnet
    }

    /// Whether this is the regression-test network.
    pub fn is_regtest(&self) -> bool {
        self.network == Network::Regtest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_values() {
        let params = ConsensusParams::mainnet();
        assert_eq!(params.modifier_interval, 21_600);
        assert_eq!(params.stake_min_age, 2_592_000);
        assert_eq!(params.stake_max_age, 7_776_000);
        assert_eq!(params.stake_target_spacing, 600);
    }

    #[test]
    fn test_network_names() {
        assert_eq!(Network::Mainnet.name(), "mainnet");
        assert_eq!(Network::Testnet.name(), "testnet");
        assert_eq!(Network::Regtest.name(), "regtest");
    }
}
