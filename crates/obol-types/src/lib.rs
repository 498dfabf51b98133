//! # obol-types
//!
//! Chain primitives for the Obol blockchain.
//!
//! This crate provides:
//! - 256-bit and 160-bit hashes with the double-SHA256 consensus hash
//! - The little-endian hash stream used by all consensus-critical hashing
//! - Scripts, outpoints, transactions and blocks
//! - Monetary amounts
//!
//! Everything here is serialization-exact: consensus code in the other
//! crates depends on the byte layout produced by [`HashWriter`] and the
//! transaction/block encoders, so changes to these must be treated as
//! hard-fork changes.

mod amount;
mod block;
mod hash;
mod script;
mod stream;
mod transaction;

pub use amount::{Amount, COIN};
pub use block::{Block, BlockHeader};
pub use hash::{hash160, sha256d, Hash160, Hash256};
pub use script::Script;
pub use stream::HashWriter;
pub use transaction::{OutPoint, Transaction, TxInput, TxOutput};
