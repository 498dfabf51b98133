//! Active chain and combined chain state.

use crate::index::{BlockId, BlockIndex, BlockIndexArena};
use crate::{ChainError, ChainResult};
use obol_types::Hash256;
use tracing::debug;

/// Number of ancestor timestamps in the median-time-past window.
const MEDIAN_TIME_SPAN: usize = 11;

/// The best-chain order: entry ids by height.
#[derive(Default)]
pub struct ActiveChain {
    ids: Vec<BlockId>,
}

impl ActiveChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain length in blocks (tip height + 1).
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the chain has no blocks.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The tip entry id.
    pub fn tip(&self) -> Option<BlockId> {
        self.ids.last().copied()
    }

    /// The entry id at a height.
    pub fn at_height(&self, height: u32) -> Option<BlockId> {
        self.ids.get(height as usize).copied()
    }

    /// Whether the given entry is on the active chain.
    pub fn contains(&self, id: BlockId, arena: &BlockIndexArena) -> bool {
        self.at_height(arena.get(id).height) == Some(id)
    }

    /// The active-chain successor of the given entry.
    pub fn next(&self, id: BlockId, arena: &BlockIndexArena) -> Option<BlockId> {
        if !self.contains(id, arena) {
            return None;
        }
        self.at_height(arena.get(id).height + 1)
    }

    /// Extend the chain with a new tip. The entry's height must follow
    /// the current tip.
    pub fn push(&mut self, id: BlockId, arena: &BlockIndexArena) -> ChainResult<()> {
        let height = arena.get(id).height;
        if height as usize != self.ids.len() {
            return Err(ChainError::NonContiguous {
                height,
                tip_height: self.ids.len().saturating_sub(1) as u32,
            });
        }
        self.ids.push(id);
        Ok(())
    }
}

/// Block index arena plus the active chain, the view every consensus
/// entry point takes. Callers hold the chain-state lock around it.
#[derive(Default)]
pub struct ChainState {
    /// All known index entries.
    pub arena: BlockIndexArena,
    /// Best-chain order.
    pub active: ActiveChain,
}

impl ChainState {
    /// Create an empty chain state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry id by block hash.
    pub fn lookup(&self, hash: &Hash256) -> Option<BlockId> {
        self.arena.lookup(hash)
    }

    /// The tip entry id.
    pub fn tip_id(&self) -> Option<BlockId> {
        self.active.tip()
    }

    /// The tip entry.
    pub fn tip(&self) -> Option<&BlockIndex> {
        self.active.tip().map(|id| self.arena.get(id))
    }

    /// Insert an entry and extend the active chain with it.
    pub fn connect_tip(&mut self, index: BlockIndex) -> ChainResult<BlockId> {
        let height = index.height;
        let hash = index.block_hash;
        let id = self.arena.insert(index)?;
        self.active.push(id, &self.arena)?;
        debug!(height, block = %hash, "connected tip");
        Ok(id)
    }

    /// Median of the last [`MEDIAN_TIME_SPAN`] block times ending at
    /// the given entry.
    pub fn median_time_past(&self, id: BlockId) -> i64 {
        let mut times: Vec<i64> = self
            .arena
            .ancestors(id)
            .take(MEDIAN_TIME_SPAN)
            .map(|(_, index)| i64::from(index.time))
            .collect();
        times.sort_unstable();
        times[times.len() / 2]
    }
}
