//! Property-based tests for consensus invariants.

use num_bigint::BigUint;
use obol_consensus::{compact_to_target, target_to_compact, ConsensusParams, EraFlags};
use obol_consensus::stake_entropy_bit;
use obol_types::{sha256d, Block, BlockHeader, Hash256, Script, COIN};
use obol_validator::{ValidatorRegistry, VALIDATOR_MIN_STAKE};
use proptest::prelude::*;

/// Canonical compact targets: mantissa with a non-zero, sign-free high
/// byte and a size that never truncates it.
fn arb_canonical_nbits() -> impl Strategy<Value = u32> {
    (3u32..=32, 0x01_0000u32..=0x7f_ffff)
        .prop_map(|(size, mantissa)| (size << 24) | mantissa)
}

fn arb_hash256() -> impl Strategy<Value = Hash256> {
    prop::array::uniform32(any::<u8>()).prop_map(Hash256)
}

proptest! {
    #[test]
    fn prop_compact_round_trips(bits in arb_canonical_nbits()) {
        let target = compact_to_target(bits);
        prop_assert_eq!(target_to_compact(&target), bits);
    }

    #[test]
    fn prop_compact_monotone_in_size(mantissa in 0x01_0000u32..=0x7f_ffff, size in 4u32..=31) {
        let smaller = compact_to_target((size << 24) | mantissa);
        let larger = compact_to_target(((size + 1) << 24) | mantissa);
        prop_assert!(larger > smaller);
    }

    #[test]
    fn prop_numeric_cmp_matches_biguint_order(a in arb_hash256(), b in arb_hash256()) {
        let wide_a = BigUint::from_bytes_le(a.as_bytes());
        let wide_b = BigUint::from_bytes_le(b.as_bytes());
        prop_assert_eq!(a.numeric_cmp(&b), wide_a.cmp(&wide_b));
    }

    #[test]
    fn prop_entropy_bit_idempotent(signature in prop::collection::vec(any::<u8>(), 0..80), seed in any::<u32>()) {
        let params = ConsensusParams::regtest();
        let eras = EraFlags::at(&params, None, 0);
        let block = Block {
            header: BlockHeader {
                version: 3,
                prev_block: sha256d(&seed.to_le_bytes()),
                merkle_root: sha256d(b"mr"),
                time: 1_600_000_000u32.wrapping_add(seed),
                bits: 0x1d00ffff,
                nonce: 0,
            },
            transactions: Vec::new(),
            signature,
        };
        let bit = stake_entropy_bit(eras, &block);
        prop_assert!(bit <= 1);
        prop_assert_eq!(bit, stake_entropy_bit(eras, &block));
    }

    #[test]
    fn prop_score_stays_in_range(
        produced in 0u32..2_000,
        missed in 0u32..2_000,
        slashes in 0u32..4,
    ) {
        let registry = ValidatorRegistry::new();
        let id = registry
            .register(Script::from(vec![0x51]), 1_000 * COIN, 0)
            .unwrap();
        for _ in 0..produced.min(64) {
            registry.update_reputation(&id, true);
        }
        for _ in 0..missed.min(64) {
            registry.update_reputation(&id, false);
        }
        for _ in 0..slashes {
            let _ = registry.slash(&id, 0, 0.1);
        }
        let validator = registry.get(&id).unwrap();
        prop_assert!((0..=100).contains(&validator.reputation.score));
        prop_assert!(validator.staked_amount >= 0);
    }

    #[test]
    fn prop_registration_gate_is_exact(stake in 0i64..(64 * COIN)) {
        let registry = ValidatorRegistry::new();
        let outcome = registry.register(Script::from(vec![0x51]), stake, 0);
        prop_assert_eq!(outcome.is_ok(), stake >= VALIDATOR_MIN_STAKE);
    }
}
