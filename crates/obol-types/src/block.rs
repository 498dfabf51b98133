//! Block headers and blocks.

use crate::hash::{sha256d, Hash256};
use crate::transaction::Transaction;

/// Block header, 80 bytes in its normal serialization.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BlockHeader {
    /// Block format version.
    pub version: i32,
    /// Hash of the parent block.
    pub prev_block: Hash256,
    /// Merkle root of the block's transactions.
    pub merkle_root: Hash256,
    /// Block timestamp in seconds since epoch.
    pub time: u32,
    /// Compact difficulty target.
    pub bits: u32,
    /// Nonce (always zero for proof-of-stake blocks).
    pub nonce: u32,
}

impl BlockHeader {
    /// Serialized size of the fixed header, used when computing the
    /// byte offset of a transaction within its block.
    pub const NORMAL_SERIALIZE_SIZE: u32 = 80;

    /// Consensus encoding of the header.
    pub fn consensus_encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::NORMAL_SERIALIZE_SIZE as usize);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(self.prev_block.as_bytes());
        out.extend_from_slice(self.merkle_root.as_bytes());
        out.extend_from_slice(&self.time.to_le_bytes());
        out.extend_from_slice(&self.bits.to_le_bytes());
        out.extend_from_slice(&self.nonce.to_le_bytes());
        out
    }

    /// Block hash: double-SHA256 over the encoded header.
    pub fn hash(&self) -> Hash256 {
        sha256d(&self.consensus_encode())
    }
}

/// A block: header, transactions and the producer's signature.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Block {
    /// The header.
    pub header: BlockHeader,
    /// Transactions; index 0 is the coinbase, index 1 the coinstake in
    /// a proof-of-stake block.
    pub transactions: Vec<Transaction>,
    /// Block signature by the coinstake key.
    pub signature: Vec<u8>,
}

impl Block {
    /// Whether the block is proof-of-stake: its second transaction is
    /// a coinstake.
    pub fn is_proof_of_stake(&self) -> bool {
        self.transactions.len() > 1 && self.transactions[1].is_coinstake()
    }

    /// The coinstake transaction, when present.
    pub fn coinstake(&self) -> Option<&Transaction> {
        if self.is_proof_of_stake() {
            Some(&self.transactions[1])
        } else {
            None
        }
    }
}
