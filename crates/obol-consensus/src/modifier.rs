//! Stake modifier engine.
//!
//! The stake modifier is a 64-bit scalar mixed into every kernel hash
//! so that a coin owner cannot precompute future proofs-of-stake at the
//! time their output confirms. It is recomputed once per modifier epoch
//! rather than per block, which keeps an attacker from grinding
//! additional modifier bits by extending the chain.
//!
//! Each modifier bit is the entropy bit of one block selected from the
//! previous epoch: the selection interval is split into 64 sections of
//! growing length, and within each section the block minimizing a
//! selection hash (seeded with the previous modifier) contributes its
//! bit.

use crate::eras::{Era, EraFlags};
use crate::error::{ConsensusError, ConsensusResult};
use crate::params::{ConsensusParams, MODIFIER_INTERVAL_RATIO};
use num_bigint::BigUint;
use obol_chain::{BlockId, BlockIndexArena, ChainState};
use obol_types::{Hash256, HashWriter};
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Result of a modifier computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextStakeModifier {
    /// The modifier in effect for the new block.
    pub modifier: u64,
    /// Whether the modifier was newly generated at this block.
    pub generated: bool,
}

/// A kernel stake modifier with the height and time of the block that
/// generated it, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelModifier {
    /// The modifier to hash into the kernel.
    pub modifier: u64,
    /// Height of the generating block.
    pub height: u32,
    /// Time of the generating block.
    pub time: i64,
}

/// Length in seconds of one selection-interval section.
///
/// Sections grow towards the end of the interval; the last section is
/// `MODIFIER_INTERVAL_RATIO` times the first.
pub fn selection_interval_section(params: &ConsensusParams, section: usize) -> i64 {
    debug_assert!(section < 64);
    params.modifier_interval * 63
        / (63 + (63 - section as i64) * (MODIFIER_INTERVAL_RATIO - 1))
}

/// Total length in seconds of the 64-section selection interval.
pub fn selection_interval(params: &ConsensusParams) -> i64 {
    (0..64)
        .map(|section| selection_interval_section(params, section))
        .sum()
}

/// Find the last generated modifier at or before `start`, returning it
/// with its generation block time.
fn last_stake_modifier(arena: &BlockIndexArena, start: BlockId) -> ConsensusResult<(u64, i64)> {
    for (_, index) in arena.ancestors(start) {
        if index.generated_stake_modifier() {
            return Ok((index.stake_modifier, i64::from(index.time)));
        }
    }
    Err(ConsensusError::MissingData(
        "no stake modifier generated at genesis".to_string(),
    ))
}

/// Select one block from the sorted candidates: the unselected block
/// with timestamp up to `cutoff` whose selection hash is smallest.
///
/// The selection hash is `H(proof_hash ++ prev_modifier)`; for
/// proof-of-stake candidates it is divided by 2^32 first so stake
/// blocks are favored over work blocks, preserving the chain's
/// energy-efficiency property. If the earliest unselected candidate
/// already lies past the cutoff it is taken alone.
fn select_block_from_candidates(
    chain: &ChainState,
    sorted_by_timestamp: &[(i64, Hash256)],
    selected: &HashSet<Hash256>,
    cutoff: i64,
    prev_modifier: u64,
) -> ConsensusResult<BlockId> {
    let mut best: Option<(BigUint, BlockId)> = None;
    for (time, hash) in sorted_by_timestamp {
        let id = chain.lookup(hash).ok_or_else(|| {
            ConsensusError::MissingData(format!("candidate block {hash} not indexed"))
        })?;
        if best.is_some() && *time > cutoff {
            break;
        }
        if selected.contains(hash) {
            continue;
        }
        let index = chain.arena.get(id);
        let proof_hash = if index.is_proof_of_stake() {
            index.hash_proof_of_stake
        } else {
            index.block_hash
        };
        let mut writer = HashWriter::new();
        writer.write_hash(&proof_hash);
        writer.write_u64(prev_modifier);
        let mut selection = BigUint::from_bytes_le(writer.finalize().as_bytes());
        if index.is_proof_of_stake() {
            selection >>= 32;
        }
        match &best {
            Some((best_hash, _)) if selection >= *best_hash => {}
            _ => best = Some((selection, id)),
        }
    }
    match best {
        Some((selection, id)) => {
            trace!(selection = %selection, height = chain.arena.get(id).height, "selected candidate");
            Ok(id)
        }
        None => Err(ConsensusError::MissingData(
            "no candidate blocks in selection round".to_string(),
        )),
    }
}

/// Compute the stake modifier for a block whose parent is `prev`.
///
/// Returns the parent's modifier unchanged while still inside the same
/// modifier epoch. At the first block of a new epoch, selects 64 blocks
/// from the previous epoch's candidate window and assembles a new
/// modifier from their entropy bits.
///
/// `eras` are the era flags of the block being connected; under v0.4+
/// the new block's own timestamp must also land in a later epoch than
/// the previous modifier.
pub fn compute_next_stake_modifier(
    params: &ConsensusParams,
    eras: EraFlags,
    chain: &ChainState,
    prev: Option<BlockId>,
    current_time: u32,
) -> ConsensusResult<NextStakeModifier> {
    let Some(prev_id) = prev else {
        // genesis block's modifier is 0
        return Ok(NextStakeModifier {
            modifier: 0,
            generated: true,
        });
    };

    let (prev_modifier, modifier_time) = last_stake_modifier(&chain.arena, prev_id)?;
    let prev_index = chain.arena.get(prev_id);
    let interval = params.modifier_interval;
    trace!(
        modifier = format_args!("{prev_modifier:#018x}"),
        time = modifier_time,
        "previous stake modifier"
    );

    if modifier_time / interval >= i64::from(prev_index.time) / interval {
        // still within the same modifier epoch
        return Ok(NextStakeModifier {
            modifier: prev_modifier,
            generated: false,
        });
    }
    if modifier_time / interval >= i64::from(current_time) / interval {
        // v0.4+ also requires the current block's timestamp to land in
        // a later epoch
        if eras.contains(Era::V04) {
            return Ok(NextStakeModifier {
                modifier: prev_modifier,
                generated: false,
            });
        }
        debug!(
            height = prev_index.height + 1,
            "pre-v0.4 modifier generated within the current epoch"
        );
    }

    // Candidate window: all ancestors inside one selection interval
    // before the epoch boundary.
    let selection_interval = selection_interval(params);
    let selection_start =
        (i64::from(prev_index.time) / interval) * interval - selection_interval;
    let mut candidates: Vec<(i64, Hash256)> =
        Vec::with_capacity((64 * interval / params.stake_target_spacing).max(1) as usize);
    for (_, index) in chain.arena.ancestors(prev_id) {
        if i64::from(index.time) < selection_start {
            break;
        }
        candidates.push((i64::from(index.time), index.block_hash));
    }

    // Shuffle before the stable sort: the sort is the semantic order;
    // the shuffle only perturbs the order equal keys arrive in, and the
    // hash tiebreak makes the final order deterministic.
    let mut rng = rand::thread_rng();
    for i in (2..candidates.len()).rev() {
        let j = rng.gen_range(0..i);
        candidates.swap(i, j);
    }
    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.numeric_cmp(&b.1)));

    // 64 selection rounds, clamped to the candidate count.
    let mut new_modifier = 0u64;
    let mut cutoff = selection_start;
    let mut selected: HashSet<Hash256> = HashSet::new();
    let rounds = candidates.len().min(64);
    for round in 0..rounds {
        cutoff += selection_interval_section(params, round);
        let id = select_block_from_candidates(chain, &candidates, &selected, cutoff, prev_modifier)?;
        let index = chain.arena.get(id);
        new_modifier |= index.stake_entropy_bit() << round;
        selected.insert(index.block_hash);
        trace!(
            round,
            cutoff,
            height = index.height,
            bit = index.stake_entropy_bit(),
            "selected modifier round"
        );
    }

    debug!(
        modifier = format_args!("{new_modifier:#018x}"),
        time = prev_index.time,
        "generated stake modifier"
    );
    Ok(NextStakeModifier {
        modifier: new_modifier,
        generated: true,
    })
}

/// Stake modifier checksum: the high 32 bits of
/// `H(prev_checksum ++ flags ++ hash_proof_of_stake ++ modifier)`.
/// Genesis omits the previous checksum.
pub fn stake_modifier_checksum(arena: &BlockIndexArena, index: &obol_chain::BlockIndex) -> u32 {
    let mut writer = HashWriter::new();
    if let Some(prev) = index.prev {
        writer.write_u32(arena.get(prev).stake_modifier_checksum);
    }
    writer.write_u32(index.flags);
    writer.write_hash(&index.hash_proof_of_stake);
    writer.write_u64(index.stake_modifier);
    let hash = writer.finalize();
    let mut high = [0u8; 4];
    high.copy_from_slice(&hash.as_bytes()[28..32]);
    u32::from_le_bytes(high)
}

/// v0.5+ kernel modifier: walk back from `prev` to the most recent
/// modifier generated at least `stake_min_age - selection_interval`
/// before the coinstake timestamp.
fn kernel_stake_modifier_v05(
    params: &ConsensusParams,
    chain: &ChainState,
    prev: BlockId,
    time_tx: u32,
) -> ConsensusResult<KernelModifier> {
    let interval = selection_interval(params);
    let mut id = prev;
    let mut index = chain.arena.get(id);
    let mut modifier_height = index.height;
    let mut modifier_time = i64::from(index.time);

    if modifier_time + params.stake_min_age - interval <= i64::from(time_tx) {
        // best block is already too old relative to the kernel timestamp
        return Err(ConsensusError::KernelCheckFailed(format!(
            "best block {} at height {} too old for stake",
            index.block_hash, index.height
        )));
    }
    while modifier_time + params.stake_min_age - interval > i64::from(time_tx) {
        let Some(parent) = index.prev else {
            return Err(ConsensusError::MissingData(
                "reached genesis looking for kernel stake modifier".to_string(),
            ));
        };
        id = parent;
        index = chain.arena.get(id);
        if index.generated_stake_modifier() {
            modifier_height = index.height;
            modifier_time = i64::from(index.time);
        }
    }
    Ok(KernelModifier {
        modifier: index.stake_modifier,
        height: modifier_height,
        time: modifier_time,
    })
}

/// v0.3 kernel modifier: walk forward from the block containing the
/// staked output until a full selection interval has elapsed, taking
/// the modifier in effect there.
///
/// The blocks between `prev` and the active chain may not lie on the
/// active chain, so a temporary segment is synthesized by walking back
/// from `prev` and iterating it in reverse.
fn kernel_stake_modifier_v03(
    params: &ConsensusParams,
    chain: &ChainState,
    prev: BlockId,
    hash_block_from: &Hash256,
    now: i64,
) -> ConsensusResult<KernelModifier> {
    let from_id = chain.lookup(hash_block_from).ok_or_else(|| {
        ConsensusError::MissingData(format!("block {hash_block_from} not indexed"))
    })?;
    let from_index = chain.arena.get(from_id);
    let from_time = i64::from(from_index.time);
    let interval = selection_interval(params);

    // Temporary segment covering any off-chain stretch below `prev`.
    let prev_index = chain.arena.get(prev);
    let depth = i64::from(prev_index.height) - (i64::from(from_index.height) - 1);
    let mut segment: Vec<BlockId> = Vec::new();
    let mut cursor = Some(prev);
    let mut walked = 1i64;
    while let Some(id) = cursor {
        if walked > depth || chain.active.contains(id, &chain.arena) {
            break;
        }
        segment.push(id);
        cursor = chain.arena.get(id).prev;
        walked += 1;
    }
    segment.reverse();

    let mut segment_pos = 0usize;
    let mut id = from_id;
    let mut modifier_height = from_index.height;
    let mut modifier_time = from_time;
    while modifier_time < from_time + interval {
        let current = chain.arena.get(id);
        let next = if !segment.is_empty()
            && current.height + 1 >= chain.arena.get(segment[0]).height
        {
            let next = segment.get(segment_pos).copied();
            segment_pos += 1;
            next
        } else {
            chain.active.next(id, &chain.arena)
        };
        let Some(next_id) = next else {
            // reached best block; may happen if the node is behind
            return if i64::from(current.time) + params.stake_min_age - interval > now {
                Err(ConsensusError::MissingData(format!(
                    "reached best block {} at height {} from block {}",
                    current.block_hash, current.height, hash_block_from
                )))
            } else {
                Err(ConsensusError::ModifierUnavailable(format!(
                    "no modifier a selection interval past block {hash_block_from} yet"
                )))
            };
        };
        id = next_id;
        let index = chain.arena.get(id);
        if index.generated_stake_modifier() {
            modifier_height = index.height;
            modifier_time = i64::from(index.time);
        }
    }
    Ok(KernelModifier {
        modifier: chain.arena.get(id).stake_modifier,
        height: modifier_height,
        time: modifier_time,
    })
}

/// The stake modifier the protocol prescribes for hashing a kernel at
/// `time_tx`, era-dependent.
pub fn kernel_stake_modifier(
    params: &ConsensusParams,
    eras: EraFlags,
    chain: &ChainState,
    prev: BlockId,
    hash_block_from: &Hash256,
    time_tx: u32,
    now: i64,
) -> ConsensusResult<KernelModifier> {
    if eras.contains(Era::V05) {
        kernel_stake_modifier_v05(params, chain, prev, time_tx)
    } else {
        kernel_stake_modifier_v03(params, chain, prev, hash_block_from, now)
    }
}
