//! Hard checkpoints of stake modifier checksums.
//!
//! The modifier computation walks far back in history; these pinned
//! checksums make any divergence fatal for the offending chain instead
//! of letting it propagate. Heights absent from the map always pass.

use crate::error::{ConsensusError, ConsensusResult};
use crate::params::{ConsensusParams, Network};

/// Mainnet checkpoints, ordered by height.
static MAINNET_CHECKPOINTS: &[(u32, u32)] = &[
    (0, 0x0e00670b),
    (19_080, 0xad4e4d29),
    (30_583, 0xdc7bf136),
    (99_999, 0xf555cfd2),
    (219_999, 0x91b7444d),
    (336_000, 0x6c3c8048),
    (371_850, 0x9b850bdf),
    (407_813, 0x46fe50b5),
    (443_561, 0x114a6e38),
    (455_470, 0x9b7af181),
    (479_189, 0xe04fb8e0),
    (504_051, 0x459f5a16),
    (589_659, 0xbd02492a),
    (714_688, 0xd70a5b68),
    (770_396, 0x565fb851),
    (801_334, 0x90485c37),
];

/// Testnet checkpoints, ordered by height.
static TESTNET_CHECKPOINTS: &[(u32, u32)] = &[
    (0, 0x0e00670b),
    (19_080, 0x3711dc3a),
    (30_583, 0xb480fade),
    (99_999, 0x9a62eaec),
    (219_999, 0xeafe96c3),
    (336_000, 0x8330dc09),
    (372_751, 0xafb94e2f),
    (382_019, 0x7f5cf5eb),
    (408_500, 0x68cadee2),
    (412_691, 0x93138e67),
    (441_299, 0x03e195cb),
    (442_735, 0xe42d94fe),
    (516_308, 0x04a0897a),
    (573_702, 0xe69df1ac),
    (612_778, 0x6be16d62),
];

fn expected_checksum(network: Network, height: u32) -> Option<u32> {
    let table = match network {
        Network::Mainnet => MAINNET_CHECKPOINTS,
        Network::Testnet => TESTNET_CHECKPOINTS,
        Network::Regtest => return None,
    };
    table
        .binary_search_by_key(&height, |(h, _)| *h)
        .ok()
        .map(|i| table[i].1)
}

/// Verify a computed modifier checksum against the hard checkpoints.
///
/// Genesis always passes: this chain uses its own genesis blocks, so
/// the inherited height-0 checkpoints do not apply.
pub fn check_stake_modifier_checkpoint(
    params: &ConsensusParams,
    height: u32,
    checksum: u32,
) -> ConsensusResult<()> {
    if height == 0 {
        return Ok(());
    }
    match expected_checksum(params.network, height) {
        Some(want) if want != checksum => Err(ConsensusError::CheckpointMismatch {
            height,
            got: checksum,
            want,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_match_passes() {
        let params = ConsensusParams::mainnet();
        assert!(check_stake_modifier_checkpoint(&params, 19_080, 0xad4e4d29).is_ok());
    }

    #[test]
    fn test_checkpoint_mismatch_fails() {
        let params = ConsensusParams::mainnet();
        let err = check_stake_modifier_checkpoint(&params, 19_080, 0xdeadbeef).unwrap_err();
        assert!(matches!(
            err,
            ConsensusError::CheckpointMismatch {
                height: 19_080,
                got: 0xdeadbeef,
                want: 0xad4e4d29,
            }
        ));
    }

    #[test]
    fn test_absent_height_passes() {
        let params = ConsensusParams::mainnet();
        assert!(check_stake_modifier_checkpoint(&params, 19_081, 0xdeadbeef).is_ok());
    }

    #[test]
    fn test_genesis_always_passes() {
        for params in [
            ConsensusParams::mainnet(),
            ConsensusParams::testnet(),
            ConsensusParams::regtest(),
        ] {
            assert!(check_stake_modifier_checkpoint(&params, 0, 0x12345678).is_ok());
        }
    }

    #[test]
    fn test_testnet_uses_own_table() {
        let params = ConsensusParams::testnet();
        assert!(check_stake_modifier_checkpoint(&params, 19_080, 0x3711dc3a).is_ok());
        assert!(check_stake_modifier_checkpoint(&params, 19_080, 0xad4e4d29).is_err());
    }

    #[test]
    fn test_regtest_has_no_checkpoints() {
        let params = ConsensusParams::regtest();
        assert!(check_stake_modifier_checkpoint(&params, 19_080, 0).is_ok());
    }

    #[test]
    fn test_tables_sorted_for_binary_search() {
        for table in [MAINNET_CHECKPOINTS, TESTNET_CHECKPOINTS] {
            for pair in table.windows(2) {
                assert!(pair[0].0 < pair[1].0);
            }
        }
    }
}
