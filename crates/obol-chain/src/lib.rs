//! # obol-chain
//!
//! Block index and active chain for the Obol node.
//!
//! This crate provides:
//! - An arena-owned block index: every [`BlockIndex`] lives in a
//!   [`BlockIndexArena`] and refers to its parent by integer id, so the
//!   modifier engine can walk ancestry without pointer cycles
//! - The [`ActiveChain`] (best-chain order) with median-time-past
//! - [`ChainState`] bundling both for consensus entry points
//! - Collaborator traits the consensus core consumes but does not
//!   implement: transaction index, script verifier, UTXO view, clock

mod chain;
mod error;
mod index;
mod traits;

pub use chain::{ActiveChain, ChainState};
pub use error::{ChainError, ChainResult};
pub use index::{
    Ancestors, BlockId, BlockIndex, BlockIndexArena, BLOCK_PROOF_OF_STAKE, BLOCK_STAKE_ENTROPY,
    BLOCK_STAKE_MODIFIER,
};
pub use traits::{Clock, Coin, CoinsView, ScriptVerifier, TransactionIndex, TxRecord};
