//! # obol-minter
//!
//! The proof-of-stake block producer.
//!
//! One cooperative loop per node: each iteration checks whether the
//! wallet's validator won the current slot, asks the block assembler
//! for a candidate whose coinstake satisfies the kernel, signs it and
//! submits it. All sleeps observe the shutdown token; wallet-locked
//! and syncing states pause the loop with a user-visible warning.

mod error;
mod minter;
mod traits;

pub use error::{MinterError, MinterResult};
pub use minter::{pos_timeout, Minter, MintWarning};
pub use traits::{AssembleOutcome, BlockAssembler, BlockTemplate, NewBlockProcessor, SyncStatus, Wallet};
