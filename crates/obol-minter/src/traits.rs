//! Collaborator interfaces of the minter.
//!
//! Block assembly, wallet operations and block submission all live in
//! the surrounding node; the minter only schedules them.

use crate::error::MinterResult;
use obol_types::{Block, Script, Transaction};
use std::sync::Arc;

/// A candidate block produced by the assembler. Its second transaction
/// is a coinstake that already satisfies the kernel predicate.
#[derive(Clone, Debug)]
pub struct BlockTemplate {
    /// The candidate block, unsigned.
    pub block: Block,
}

/// Outcome of one candidate-assembly attempt.
#[derive(Debug)]
pub enum AssembleOutcome {
    /// A candidate was built.
    Candidate(Box<BlockTemplate>),
    /// No kernel was found in the search window; try again next slot.
    TryLater,
    /// Assembly failed outright (for example the keypool ran out).
    Failed(String),
}

/// Block assembler: builds a candidate block paying `mint_script`,
/// with transaction selection policy entirely its own.
pub trait BlockAssembler: Send + Sync {
    /// Attempt to build a candidate for the current tip.
    fn create_candidate(&self, mint_script: &Script) -> AssembleOutcome;
}

/// Wallet operations the minter needs.
pub trait Wallet: Send + Sync {
    /// Whether the wallet is locked (minting pauses while it is).
    fn is_locked(&self) -> bool;

    /// The mint-key script used to match our registry entry and to
    /// receive the block reward.
    fn mint_script(&self) -> Script;

    /// Number of spendable outputs, sizing the per-slot timeout.
    fn utxo_count(&self) -> usize;

    /// Search `(last_search_time, last_search_time + search_interval]`
    /// for a coinstake satisfying the kernel at `bits`.
    fn create_coinstake(
        &self,
        bits: u32,
        search_interval: i64,
        dest: &Script,
    ) -> Option<Transaction>;

    /// Sign a candidate block with the mint key.
    fn sign_block(&self, block: &mut Block) -> bool;
}

/// Hands finished blocks to validation and relay.
pub trait NewBlockProcessor: Send + Sync {
    /// Validate and announce a freshly minted block.
    fn submit(&self, block: Arc<Block>) -> MinterResult<()>;
}

/// Initial-sync state of the node.
pub trait SyncStatus: Send + Sync {
    /// Whether the node is still synchronizing headers or blocks.
    fn is_syncing(&self) -> bool;
}
