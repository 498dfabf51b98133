//! Consensus integration tests: modifier engine and kernel over
//! harness-built chains.

use crate::harness::ChainHarness;
use obol_chain::{ScriptVerifier, TransactionIndex, TxRecord};
use obol_consensus::{
    check_proof_of_stake, check_stake_kernel_hash, compute_next_stake_modifier,
    stake_modifier_checksum, ConsensusError, ConsensusParams, KernelStake,
};
use obol_types::{
    sha256d, BlockHeader, Hash256, OutPoint, Script, Transaction, TxInput, TxOutput, COIN,
};

/// Parameters where the v0.5 modifier walk has a positive lookup
/// horizon: minimum age comfortably above the selection interval.
fn kernel_params() -> ConsensusParams {
    ConsensusParams {
        stake_min_age: 100_000,
        stake_max_age: 200_000,
        ..ConsensusParams::regtest()
    }
}

fn staking_tx(time: u32, value: i64) -> Transaction {
    Transaction {
        version: 1,
        time,
        inputs: vec![TxInput {
            prevout: OutPoint {
                txid: sha256d(b"origin"),
                vout: 0,
            },
            script_sig: Script::default(),
            sequence: u32::MAX,
        }],
        outputs: vec![TxOutput {
            value,
            script_pubkey: Script::from(&[0x51][..]),
        }],
        lock_time: 0,
    }
}

fn header_at(time: u32) -> BlockHeader {
    BlockHeader {
        version: 3,
        prev_block: Hash256::ZERO,
        merkle_root: sha256d(b"merkle"),
        time,
        bits: 0x2100ffff,
        nonce: 0,
    }
}

#[test]
fn test_checksum_invariant_over_long_chain() {
    let mut harness = ChainHarness::new();
    let ids = harness.extend(50, 2_400_000, 700);
    for id in ids {
        let index = harness.chain.arena.get(id);
        assert_eq!(
            index.stake_modifier_checksum,
            stake_modifier_checksum(&harness.chain.arena, index),
            "checksum must recompute identically at height {}",
            index.height
        );
    }
}

#[test]
fn test_modifier_generation_recurs_each_epoch() {
    let mut harness = ChainHarness::new(); // interval 1200
    let ids = harness.extend(50, 2_400_000, 700);
    let generated: Vec<u32> = ids
        .iter()
        .filter(|id| harness.chain.arena.get(**id).generated_stake_modifier())
        .map(|id| harness.chain.arena.get(*id).height)
        .collect();
    // genesis generates, and new epochs keep producing modifiers
    assert!(generated.len() > 5, "generated at heights {generated:?}");
    assert_eq!(generated[0], 0);
}

#[test]
fn test_modifier_recompute_is_idempotent_across_chain() {
    let mut harness = ChainHarness::new();
    let ids = harness.extend(30, 2_400_000, 700);
    for id in ids {
        let index = harness.chain.arena.get(id);
        let again = compute_next_stake_modifier(
            &harness.params,
            harness.eras(index.time),
            &harness.chain,
            index.prev,
            index.time,
        )
        .unwrap();
        assert_eq!(again.modifier, index.stake_modifier);
        assert_eq!(again.generated, index.generated_stake_modifier());
    }
}

/// Build a chain long enough for the v0.5 kernel walk, and a staked
/// output old enough to mint.
fn kernel_fixture() -> (ChainHarness, Transaction, BlockHeader, u32) {
    let params = kernel_params();
    let mut harness = ChainHarness::with_params(params);
    let t0 = 2_400_000u32;
    harness.extend(40, t0, 1_300);
    let tx_prev = staking_tx(t0, 100 * COIN);
    let block_from = header_at(t0);
    let time_tx = t0 + 105_000;
    (harness, tx_prev, block_from, time_tx)
}

#[test]
fn test_kernel_passes_under_easy_target() {
    let (harness, tx_prev, block_from, time_tx) = kernel_fixture();
    let prev = harness.chain.tip_id().unwrap();
    let prevout = OutPoint {
        txid: tx_prev.txid(),
        vout: 0,
    };
    let stake = KernelStake {
        bits: 0x2100ffff, // an almost-unbounded target
        block_from: &block_from,
        tx_prev_offset: 81,
        tx_prev: &tx_prev,
        prevout: &prevout,
        time_tx,
    };
    let eras = harness.eras(time_tx);
    let hash = check_stake_kernel_hash(&harness.params, eras, &harness.chain, prev, &stake, 0)
        .expect("kernel should pass under an easy target");

    // re-running the accepted kernel reproduces the same proof hash
    let again = check_stake_kernel_hash(&harness.params, eras, &harness.chain, prev, &stake, 0)
        .unwrap();
    assert_eq!(hash, again);
}

#[test]
fn test_kernel_fails_under_hard_target() {
    let (harness, tx_prev, block_from, time_tx) = kernel_fixture();
    let prev = harness.chain.tip_id().unwrap();
    let prevout = OutPoint {
        txid: tx_prev.txid(),
        vout: 0,
    };
    let stake = KernelStake {
        bits: 0x0100_0001, // a target of zero
        block_from: &block_from,
        tx_prev_offset: 81,
        tx_prev: &tx_prev,
        prevout: &prevout,
        time_tx,
    };
    let eras = harness.eras(time_tx);
    let err = check_stake_kernel_hash(&harness.params, eras, &harness.chain, prev, &stake, 0)
        .unwrap_err();
    assert!(matches!(err, ConsensusError::KernelCheckFailed(_)));
}

struct SingleTxIndex(TxRecord);

impl TransactionIndex for SingleTxIndex {
    fn find(&self, txid: &Hash256) -> Option<TxRecord> {
        (self.0.tx.txid() == *txid).then(|| self.0.clone())
    }
}

struct AcceptAll;

impl ScriptVerifier for AcceptAll {
    fn verify_input(&self, _tx: &Transaction, _input: usize, _prev: &TxOutput) -> bool {
        true
    }
}

#[test]
fn test_check_proof_of_stake_end_to_end() {
    let (harness, tx_prev, block_from, time_tx) = kernel_fixture();
    let prev = harness.chain.tip_id().unwrap();
    let prevout = OutPoint {
        txid: tx_prev.txid(),
        vout: 0,
    };
    let coinstake = Transaction {
        version: 1,
        time: time_tx,
        inputs: vec![TxInput {
            prevout,
            script_sig: Script::from(&[0x51][..]),
            sequence: u32::MAX,
        }],
        outputs: vec![
            TxOutput::empty(),
            TxOutput {
                value: 100 * COIN,
                script_pubkey: Script::from(&[0x52][..]),
            },
        ],
        lock_time: 0,
    };
    let index = SingleTxIndex(TxRecord {
        header: block_from,
        offset: 1,
        tx: tx_prev,
    });
    let eras = harness.eras(time_tx);
    let hash = check_proof_of_stake(
        &harness.params,
        eras,
        &harness.chain,
        &index,
        &AcceptAll,
        prev,
        &coinstake,
        0x2100ffff,
        time_tx,
        0,
    )
    .expect("coinstake should verify end to end");
    assert!(!hash.is_zero());
}
