//! Test harness building synthetic chains.
//!
//! Blocks are appended through the real modifier engine so the indices
//! carry the exact modifier, checksum and entropy state a live node
//! would commit.

use obol_chain::{BlockId, BlockIndex, ChainState};
use obol_consensus::{
    compute_next_stake_modifier, stake_modifier_checksum, ConsensusParams, EraFlags,
};
use obol_types::{sha256d, Hash256};

/// A chain of synthetic block indices.
pub struct ChainHarness {
    /// Consensus parameters in force.
    pub params: ConsensusParams,
    /// The chain under test.
    pub chain: ChainState,
}

impl ChainHarness {
    /// New harness on regtest parameters.
    pub fn new() -> Self {
        Self::with_params(ConsensusParams::regtest())
    }

    /// New harness on the given parameters.
    pub fn with_params(params: ConsensusParams) -> Self {
        ChainHarness {
            params,
            chain: ChainState::new(),
        }
    }

    /// Era flags for a block timestamped `time` on the current tip.
    pub fn eras(&self, time: u32) -> EraFlags {
        let prev = self.chain.tip_id().map(|id| self.chain.arena.get(id));
        EraFlags::at(&self.params, prev, time)
    }

    /// Append a block with the given timestamp and entropy bit,
    /// running the modifier engine and checksum exactly as header
    /// acceptance does. Proof-of-stake blocks get a synthetic kernel
    /// hash.
    pub fn push_block(&mut self, time: u32, proof_of_stake: bool, entropy_bit: u32) -> BlockId {
        let prev = self.chain.tip_id();
        let height = prev
            .map(|id| self.chain.arena.get(id).height + 1)
            .unwrap_or(0);
        let hash = sha256d(&[&height.to_le_bytes()[..], &time.to_le_bytes()[..]].concat());
        let eras = self.eras(time);

        let mut index = BlockIndex::new(height, time, 3, prev, hash);
        if proof_of_stake {
            index.set_proof_of_stake();
            index.hash_proof_of_stake = sha256d(&[b"kernel", &height.to_le_bytes()[..]].concat());
        }
        index.set_stake_entropy_bit(entropy_bit);

        let next = compute_next_stake_modifier(&self.params, eras, &self.chain, prev, time)
            .expect("modifier computation");
        index.set_stake_modifier(next.modifier, next.generated);
        index.stake_modifier_checksum = stake_modifier_checksum(&self.chain.arena, &index);
        self.chain.connect_tip(index).expect("connect tip")
    }

    /// Append `count` blocks with the given spacing, alternating
    /// entropy bits.
    pub fn extend(&mut self, count: u32, start_time: u32, spacing: u32) -> Vec<BlockId> {
        (0..count)
            .map(|i| self.push_block(start_time + i * spacing, i % 2 == 1, i & 1))
            .collect()
    }

    /// The tip's block hash.
    pub fn tip_hash(&self) -> Hash256 {
        self.chain.tip().expect("non-empty chain").block_hash
    }
}

impl Default for ChainHarness {
    fn default() -> Self {
        Self::new()
    }
}
