//! Node context wiring the consensus core together.
//!
//! The node owns the chain state and the validator registry; nothing
//! in the core reaches for process-wide globals. Block acceptance runs
//! under the chain-state write lock: entropy bit, stake modifier,
//! checksum and checkpoint are all committed before the entry becomes
//! visible, so kernel validation of children always sees a finished
//! parent.

use anyhow::{anyhow, Result};
use num_bigint::BigUint;
use num_traits::One;
use obol_chain::{BlockId, BlockIndex, ChainState, Clock};
use obol_consensus::{
    check_stake_modifier_checkpoint, compact_to_target, compute_next_stake_modifier,
    stake_entropy_bit, stake_modifier_checksum, ConsensusParams, EraFlags,
};
use obol_minter::{BlockAssembler, Minter, NewBlockProcessor, SyncStatus, Wallet};
use obol_types::{Block, Hash256};
use obol_validator::ValidatorRegistry;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// The node context.
pub struct Node {
    params: ConsensusParams,
    chain: Arc<RwLock<ChainState>>,
    registry: Arc<ValidatorRegistry>,
    shutdown: CancellationToken,
}

impl Node {
    /// Create a node for the given network.
    pub fn new(params: ConsensusParams) -> Self {
        info!(network = params.network.name(), "node context created");
        Node {
            params,
            chain: Arc::new(RwLock::new(ChainState::new())),
            registry: Arc::new(ValidatorRegistry::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Consensus parameters.
    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    /// Shared chain state.
    pub fn chain(&self) -> Arc<RwLock<ChainState>> {
        Arc::clone(&self.chain)
    }

    /// Shared validator registry.
    pub fn registry(&self) -> Arc<ValidatorRegistry> {
        Arc::clone(&self.registry)
    }

    /// Shutdown token observed by all loops.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Request shutdown.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Accept a validated block into the index and extend the tip.
    ///
    /// `hash_proof_of_stake` is the kernel hash returned by coinstake
    /// verification for proof-of-stake blocks. The stake modifier is
    /// computed and checkpointed here, before the entry is published.
    pub fn connect_block(
        &self,
        block: &Block,
        hash_proof_of_stake: Option<Hash256>,
    ) -> Result<BlockId> {
        let mut chain = self.chain.write();
        let hash = block.header.hash();

        let prev = if block.header.prev_block.is_zero() {
            None
        } else {
            Some(chain.lookup(&block.header.prev_block).ok_or_else(|| {
                anyhow!("parent block {} not indexed", block.header.prev_block)
            })?)
        };
        let (height, eras, prev_height_stake) = match prev {
            Some(id) => {
                let parent = chain.arena.get(id);
                (
                    parent.height + 1,
                    EraFlags::at(&self.params, Some(parent), block.header.time),
                    parent.height_stake,
                )
            }
            None => (
                0,
                EraFlags::at(&self.params, None, block.header.time),
                0,
            ),
        };

        let mut index = BlockIndex::new(
            height,
            block.header.time,
            block.header.version,
            prev,
            hash,
        );
        if block.is_proof_of_stake() {
            index.set_proof_of_stake();
            index.hash_proof_of_stake = hash_proof_of_stake.unwrap_or(Hash256::ZERO);
            index.height_stake = prev_height_stake + 1;
        } else {
            index.height_stake = prev_height_stake;
        }
        index.set_stake_entropy_bit(stake_entropy_bit(eras, block));

        let next =
            compute_next_stake_modifier(&self.params, eras, &chain, prev, block.header.time)?;
        index.set_stake_modifier(next.modifier, next.generated);
        index.stake_modifier_checksum = stake_modifier_checksum(&chain.arena, &index);
        check_stake_modifier_checkpoint(&self.params, height, index.stake_modifier_checksum)?;

        index.chain_trust = match prev {
            Some(id) => chain.arena.get(id).chain_trust.clone() + block_trust(block.header.bits),
            None => block_trust(block.header.bits),
        };

        debug!(
            height,
            block = %hash,
            modifier = format_args!("{:#018x}", index.stake_modifier),
            generated = next.generated,
            checksum = format_args!("{:#010x}", index.stake_modifier_checksum),
            "block index entry committed"
        );
        Ok(chain.connect_tip(index)?)
    }

    /// Build the stake minter over the node's state and the given
    /// collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn minter(
        &self,
        wallet: Arc<dyn Wallet>,
        assembler: Arc<dyn BlockAssembler>,
        processor: Arc<dyn NewBlockProcessor>,
        sync: Arc<dyn SyncStatus>,
        clock: Arc<dyn Clock>,
    ) -> Minter {
        Minter::new(
            self.params.clone(),
            self.chain(),
            self.registry(),
            wallet,
            assembler,
            processor,
            sync,
            clock,
            self.shutdown.clone(),
        )
    }
}

/// Trust contributed by one block at the given target.
fn block_trust(bits: u32) -> BigUint {
    let target = compact_to_target(bits);
    (BigUint::one() << 256usize) / (target + BigUint::one())
}

#[cfg(test)]
mod tests {
    use super::*;
    use obol_types::{sha256d, BlockHeader};

    fn block(prev: Hash256, time: u32, nonce: u32) -> Block {
        Block {
            header: BlockHeader {
                version: 3,
                prev_block: prev,
                merkle_root: sha256d(&nonce.to_le_bytes()),
                time,
                bits: 0x1f00ffff,
                nonce,
            },
            transactions: Vec::new(),
            signature: vec![nonce as u8],
        }
    }

    #[test]
    fn test_connect_genesis_and_children() {
        let node = Node::new(ConsensusParams::regtest());
        let genesis = block(Hash256::ZERO, 2_400_000, 0);
        let genesis_id = node.connect_block(&genesis, None).unwrap();

        let chain = node.chain();
        {
            let chain = chain.read();
            let entry = chain.arena.get(genesis_id);
            assert_eq!(entry.height, 0);
            assert!(entry.generated_stake_modifier());
            assert_eq!(entry.stake_modifier, 0);
        }

        let child = block(genesis.header.hash(), 2_400_060, 1);
        let child_id = node.connect_block(&child, None).unwrap();
        let chain = chain.read();
        let entry = chain.arena.get(child_id);
        assert_eq!(entry.height, 1);
        assert_eq!(entry.prev, Some(genesis_id));
        assert!(entry.chain_trust > chain.arena.get(genesis_id).chain_trust);
        // checksum chains from the parent
        assert_eq!(
            entry.stake_modifier_checksum,
            stake_modifier_checksum(&chain.arena, entry)
        );
    }

    #[test]
    fn test_connect_orphan_rejected() {
        let node = Node::new(ConsensusParams::regtest());
        let orphan = block(sha256d(b"unknown parent"), 2_400_000, 7);
        assert!(node.connect_block(&orphan, None).is_err());
    }

    #[test]
    fn test_block_trust_grows_with_difficulty() {
        // smaller target, more trust
        assert!(block_trust(0x1c00ffff) > block_trust(0x1d00ffff));
    }
}
