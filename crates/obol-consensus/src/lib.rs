//! # obol-consensus
//!
//! Proof-of-stake consensus rules for the Obol blockchain.
//!
//! This crate provides:
//! - Protocol era predicates and the per-block [`EraFlags`] bitset
//! - The stake modifier engine: per-epoch 64-bit modifiers assembled
//!   from entropy bits of selected past blocks
//! - The stake kernel: the coin-age weighted hash predicate that
//!   authorizes proof-of-stake blocks
//! - Coinstake verification glue over the transaction index and script
//!   interpreter seams
//! - Hard-coded stake modifier checksum checkpoints
//!
//! ## Kernel protocol
//!
//! A coinstake kernel passes when
//!
//! ```text
//! hash(modifier ++ time_block_from ++ tx_prev_offset ++ time_tx_prev
//!      ++ prevout_n ++ time_tx)  <=  target_per_coin_day * coin_day_weight
//! ```
//!
//! where the modifier is the per-epoch stake modifier under the v0.3+
//! protocols and the compact difficulty bits before that. All scalars
//! stream little-endian; the comparison is unsigned 256-bit. Any
//! deviation in byte layout or arithmetic forks the chain.

mod checkpoints;
mod entropy;
mod eras;
mod error;
mod kernel;
mod modifier;
mod params;
mod target;

pub use checkpoints::check_stake_modifier_checkpoint;
pub use entropy::stake_entropy_bit;
pub use eras::{how_super_majority, is_super_majority, Era, EraFlags};
pub use error::{ConsensusError, ConsensusResult};
pub use kernel::{
    check_coinstake_timestamp, check_proof_of_stake, check_stake_kernel_hash, KernelStake,
};
pub use modifier::{
    compute_next_stake_modifier, kernel_stake_modifier, selection_interval,
    selection_interval_section, stake_modifier_checksum, KernelModifier, NextStakeModifier,
};
pub use params::{
    ConsensusParams, Network, MAX_FUTURE_BLOCK_TIME, MAX_FUTURE_BLOCK_TIME_PREV9,
    MODIFIER_INTERVAL_RATIO,
};
pub use target::{compact_to_target, target_to_compact};
