//! Arena-owned block index.
//!
//! The chain owns all index entries in a single vector; children refer
//! to their parent by [`BlockId`]. Entries are immutable after header
//! acceptance except for the stake-modifier fields, which validation
//! populates before the entry becomes visible to other threads.

use num_bigint::BigUint;
use obol_types::Hash256;
use std::collections::HashMap;

/// Index of a [`BlockIndex`] inside its arena.
pub type BlockId = usize;

/// Flag: the block is proof-of-stake.
pub const BLOCK_PROOF_OF_STAKE: u32 = 1 << 0;
/// Flag: the block's entropy bit (bit contributed to a future modifier).
pub const BLOCK_STAKE_ENTROPY: u32 = 1 << 1;
/// Flag: a stake modifier was generated at this block.
pub const BLOCK_STAKE_MODIFIER: u32 = 1 << 2;

/// One entry in the block index.
///
/// The flags word participates in the stake-modifier checksum, so the
/// flag bit assignments are consensus critical.
#[derive(Clone, Debug)]
pub struct BlockIndex {
    /// Height in the chain (genesis is 0).
    pub height: u32,
    /// Block timestamp in seconds since epoch.
    pub time: u32,
    /// Block version.
    pub version: i32,
    /// Flag bits (`BLOCK_*`).
    pub flags: u32,
    /// Parent entry, `None` for genesis.
    pub prev: Option<BlockId>,
    /// Hash of the block.
    pub block_hash: Hash256,
    /// Kernel hash for proof-of-stake blocks, zero otherwise.
    pub hash_proof_of_stake: Hash256,
    /// Stake modifier in effect at this block. Carried forward from the
    /// parent when not newly generated.
    pub stake_modifier: u64,
    /// High 32 bits of the modifier checksum chain.
    pub stake_modifier_checksum: u32,
    /// Cumulative chain trust.
    pub chain_trust: BigUint,
    /// Number of proof-of-stake ancestors, inclusive.
    pub height_stake: u32,
}

impl BlockIndex {
    /// Create an entry with modifier fields unset.
    pub fn new(
        height: u32,
        time: u32,
        version: i32,
        prev: Option<BlockId>,
        block_hash: Hash256,
    ) -> Self {
        BlockIndex {
            height,
            time,
            version,
            flags: 0,
            prev,
            block_hash,
            hash_proof_of_stake: Hash256::ZERO,
            stake_modifier: 0,
            stake_modifier_checksum: 0,
            chain_trust: BigUint::default(),
            height_stake: 0,
        }
    }

    /// Whether the block is proof-of-stake.
    pub fn is_proof_of_stake(&self) -> bool {
        self.flags & BLOCK_PROOF_OF_STAKE != 0
    }

    /// Mark the block as proof-of-stake.
    pub fn set_proof_of_stake(&mut self) {
        self.flags |= BLOCK_PROOF_OF_STAKE;
    }

    /// The entropy bit this block contributes to future modifiers.
    pub fn stake_entropy_bit(&self) -> u64 {
        u64::from((self.flags & BLOCK_STAKE_ENTROPY) >> 1)
    }

    /// Record the entropy bit. Only bit values 0 and 1 are meaningful.
    pub fn set_stake_entropy_bit(&mut self, bit: u32) {
        self.flags &= !BLOCK_STAKE_ENTROPY;
        if bit & 1 != 0 {
            self.flags |= BLOCK_STAKE_ENTROPY;
        }
    }

    /// Whether a modifier was newly generated at this block.
    pub fn generated_stake_modifier(&self) -> bool {
        self.flags & BLOCK_STAKE_MODIFIER != 0
    }

    /// Record the stake modifier for this block.
    pub fn set_stake_modifier(&mut self, modifier: u64, generated: bool) {
        self.stake_modifier = modifier;
        if generated {
            self.flags |= BLOCK_STAKE_MODIFIER;
        }
    }
}

/// Owner of all block index entries.
#[derive(Default)]
pub struct BlockIndexArena {
    entries: Vec<BlockIndex>,
    by_hash: HashMap<Hash256, BlockId>,
}

impl BlockIndexArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert an entry, returning its id.
    pub fn insert(&mut self, index: BlockIndex) -> crate::ChainResult<BlockId> {
        if self.by_hash.contains_key(&index.block_hash) {
            return Err(crate::ChainError::DuplicateBlock(index.block_hash));
        }
        let id = self.entries.len();
        self.by_hash.insert(index.block_hash, id);
        self.entries.push(index);
        Ok(id)
    }

    /// Entry by id. Ids are only minted by `insert`, so this indexes
    /// directly.
    pub fn get(&self, id: BlockId) -> &BlockIndex {
        &self.entries[id]
    }

    /// Mutable entry by id.
    pub fn get_mut(&mut self, id: BlockId) -> &mut BlockIndex {
        &mut self.entries[id]
    }

    /// Look up an entry id by block hash.
    pub fn lookup(&self, hash: &Hash256) -> Option<BlockId> {
        self.by_hash.get(hash).copied()
    }

    /// Iterate from `start` towards genesis, inclusive.
    pub fn ancestors(&self, start: BlockId) -> Ancestors<'_> {
        Ancestors {
            arena: self,
            next: Some(start),
        }
    }
}

/// Iterator over a block's ancestry, tip-to-genesis.
pub struct Ancestors<'a> {
    arena: &'a BlockIndexArena,
    next: Option<BlockId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (BlockId, &'a BlockIndex);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let index = self.arena.get(id);
        self.next = index.prev;
        Some((id, index))
    }
}
