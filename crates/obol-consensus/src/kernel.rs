//! The stake kernel.
//!
//! A coinstake's first input (the kernel) must satisfy
//!
//! ```text
//! hash(modifier ++ time_block_from ++ tx_prev_offset ++ time_tx_prev
//!      ++ prevout_n ++ time_tx)  <=  target_per_coin_day * coin_day_weight
//! ```
//!
//! so the chance of minting is proportional to the coin age consumed.
//! The hashed fields exist to stop nodes from grinding: the stake
//! modifier scrambles proofs computed at confirmation time, the block
//! time and transaction offset de-synchronize nodes staking the same
//! output set, and block or transaction hashes are deliberately absent
//! because they can be reground in bulk.

use crate::eras::{Era, EraFlags};
use crate::error::{ConsensusError, ConsensusResult};
use crate::modifier::kernel_stake_modifier;
use crate::params::{ConsensusParams, MAX_FUTURE_BLOCK_TIME_PREV9};
use crate::target::compact_to_target;
use num_bigint::BigUint;
use obol_chain::{BlockId, ChainState, ScriptVerifier, TransactionIndex};
use obol_types::{
    BlockHeader, Hash256, HashWriter, OutPoint, Transaction, COIN,
};
use tracing::debug;

/// Seconds per coin-day.
const COIN_DAY_SECS: i64 = 24 * 60 * 60;

/// A kernel to check: the staked output's provenance plus the
/// coinstake timestamp.
#[derive(Debug)]
pub struct KernelStake<'a> {
    /// Compact difficulty target of the block under validation.
    pub bits: u32,
    /// Header of the block containing the staked output.
    pub block_from: &'a BlockHeader,
    /// Byte offset of `tx_prev` within its block, including the fixed
    /// header size.
    pub tx_prev_offset: u32,
    /// The transaction providing the staked output.
    pub tx_prev: &'a Transaction,
    /// The staked output.
    pub prevout: &'a OutPoint,
    /// Timestamp of the coinstake being checked.
    pub time_tx: u32,
}

/// Check a stake kernel against the hash target, returning the kernel
/// hash on success.
///
/// `prev` is the parent of the block under validation; `now` is the
/// adjusted wall clock, used only to classify modifier-walk failures.
pub fn check_stake_kernel_hash(
    params: &ConsensusParams,
    eras: EraFlags,
    chain: &ChainState,
    prev: BlockId,
    stake: &KernelStake<'_>,
    now: i64,
) -> ConsensusResult<Hash256> {
    let time_block_from = stake.block_from.time;
    let time_tx_prev = if stake.tx_prev.time != 0 {
        stake.tx_prev.time
    } else {
        time_block_from
    };

    if stake.time_tx < time_tx_prev {
        return Err(ConsensusError::KernelCheckFailed("nTime violation".to_string()));
    }
    if i64::from(time_block_from) + params.stake_min_age > i64::from(stake.time_tx) {
        return Err(ConsensusError::KernelCheckFailed("min age violation".to_string()));
    }

    let target_per_coin_day = compact_to_target(stake.bits);
    let output = stake
        .tx_prev
        .outputs
        .get(stake.prevout.vout as usize)
        .ok_or_else(|| {
            ConsensusError::MissingData(format!(
                "prevout {} out of range for {}",
                stake.prevout.vout,
                stake.tx_prev.txid()
            ))
        })?;
    let value_in = output.value;

    let time_weight = kernel_time_weight(params, eras, stake.time_tx, time_tx_prev);
    let coin_day_weight = BigUint::from(value_in.max(0) as u64)
        * BigUint::from(time_weight.max(0) as u64)
        / BigUint::from(COIN as u64)
        / BigUint::from(COIN_DAY_SECS as u64);

    let mut writer = HashWriter::new();
    let modifier = if eras.contains(Era::V03) {
        let found = kernel_stake_modifier(
            params,
            eras,
            chain,
            prev,
            &stake.block_from.hash(),
            stake.time_tx,
            now,
        )?;
        writer.write_u64(found.modifier);
        found.modifier
    } else {
        // v0.2: the compact target stands in for the modifier
        writer.write_u32(stake.bits);
        u64::from(stake.bits)
    };
    writer.write_u32(time_block_from);
    writer.write_u32(stake.tx_prev_offset);
    writer.write_u32(time_tx_prev);
    writer.write_u32(stake.prevout.vout);
    writer.write_u32(stake.time_tx);
    let hash_proof = writer.finalize();

    debug!(
        modifier = format_args!("{modifier:#018x}"),
        time_block_from,
        tx_prev_offset = stake.tx_prev_offset,
        time_tx_prev,
        prevout = stake.prevout.vout,
        time_tx = stake.time_tx,
        hash = %hash_proof,
        "kernel hash check"
    );

    let hash_value = BigUint::from_bytes_le(hash_proof.as_bytes());
    if hash_value > coin_day_weight * target_per_coin_day {
        return Err(ConsensusError::KernelCheckFailed(format!(
            "kernel hash {hash_proof} does not meet target"
        )));
    }
    Ok(hash_proof)
}

/// Coin-age time weight, capped at the maximum age. v0.3 starts the
/// weight from zero at the minimum age, which pulls more active coins
/// into the hash when proof-of-stake difficulty is low.
fn kernel_time_weight(
    params: &ConsensusParams,
    eras: EraFlags,
    time_tx: u32,
    time_tx_prev: u32,
) -> i64 {
    (i64::from(time_tx) - i64::from(time_tx_prev)).min(params.stake_max_age)
        - if eras.contains(Era::V03) {
            params.stake_min_age
        } else {
            0
        }
}

/// Check the kernel hash target and the coinstake signature.
///
/// Locates the staked output through the transaction index, verifies
/// the spending script, then runs the kernel predicate. Returns the
/// kernel hash recorded into the block index on success.
pub fn check_proof_of_stake(
    params: &ConsensusParams,
    eras: EraFlags,
    chain: &ChainState,
    tx_index: &dyn TransactionIndex,
    scripts: &dyn ScriptVerifier,
    prev: BlockId,
    tx: &Transaction,
    bits: u32,
    time_tx: u32,
    now: i64,
) -> ConsensusResult<Hash256> {
    if !tx.is_coinstake() {
        return Err(ConsensusError::KernelCheckFailed(format!(
            "called on non-coinstake {}",
            tx.txid()
        )));
    }

    // kernel (input 0) must match the stake hash target per coin age
    let txin = &tx.inputs[0];
    let record = tx_index.find(&txin.prevout.txid).ok_or_else(|| {
        ConsensusError::MissingData(format!("tx index miss for {}", txin.prevout.txid))
    })?;
    if record.tx.txid() != txin.prevout.txid {
        return Err(ConsensusError::MissingData(format!(
            "txid mismatch in transaction index for {}",
            txin.prevout.txid
        )));
    }
    let prev_out = record
        .tx
        .outputs
        .get(txin.prevout.vout as usize)
        .ok_or_else(|| {
            ConsensusError::MissingData(format!(
                "prevout {} out of range for {}",
                txin.prevout.vout, txin.prevout.txid
            ))
        })?;

    if !scripts.verify_input(tx, 0, prev_out) {
        return Err(ConsensusError::ScriptVerifyFailed(format!(
            "invalid-pos-script on coinstake {}",
            tx.txid()
        )));
    }

    let stake = KernelStake {
        bits,
        block_from: &record.header,
        tx_prev_offset: record.offset + BlockHeader::NORMAL_SERIALIZE_SIZE,
        tx_prev: &record.tx,
        prevout: &txin.prevout,
        time_tx,
    };
    check_stake_kernel_hash(params, eras, chain, prev, &stake, now)
}

/// Whether the coinstake timestamp meets protocol: equal to the block
/// time under v0.3+, within the bounded drift window before that.
pub fn check_coinstake_timestamp(eras: EraFlags, time_block: i64, time_tx: i64) -> bool {
    if eras.contains(Era::V03) {
        time_block == time_tx
    } else {
        time_tx <= time_block && time_block <= time_tx + MAX_FUTURE_BLOCK_TIME_PREV9
    }
}
