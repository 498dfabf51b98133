//! Transactions with timestamps.
//!
//! Obol transactions carry a `time` field (the coinstake timestamp is
//! the heart of the kernel protocol). The consensus encoding is the
//! classic little-endian layout; `txid` is double-SHA256 over it.

use crate::hash::{sha256d, Hash256};
use crate::script::Script;
use crate::stream::compact_size;
use crate::Amount;
use std::fmt;

/// Reference to a transaction output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct OutPoint {
    /// Transaction id of the source transaction.
    pub txid: Hash256,
    /// Output index within the source transaction.
    pub vout: u32,
}

impl OutPoint {
    /// The null outpoint used by coinbase inputs.
    pub fn null() -> Self {
        OutPoint {
            txid: Hash256::ZERO,
            vout: u32::MAX,
        }
    }

    /// Whether this is the null (coinbase) outpoint.
    pub fn is_null(&self) -> bool {
        self.txid.is_zero() && self.vout == u32::MAX
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// Transaction input.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TxInput {
    /// The output being spent.
    pub prevout: OutPoint,
    /// Unlocking script.
    pub script_sig: Script,
    /// Sequence number.
    pub sequence: u32,
}

/// Transaction output.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TxOutput {
    /// Value in satoshi units.
    pub value: Amount,
    /// Locking script.
    pub script_pubkey: Script,
}

impl TxOutput {
    /// An empty output (zero value, empty script), the coinstake marker.
    pub fn empty() -> Self {
        TxOutput {
            value: 0,
            script_pubkey: Script::default(),
        }
    }

    /// Whether this output is the empty coinstake marker.
    pub fn is_empty_marker(&self) -> bool {
        self.value == 0 && self.script_pubkey.is_empty()
    }
}

/// A transaction.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Transaction {
    /// Transaction format version.
    pub version: u32,
    /// Transaction timestamp in seconds since epoch. Zero means
    /// "inherit the containing block's time" in kernel math.
    pub time: u32,
    /// Inputs.
    pub inputs: Vec<TxInput>,
    /// Outputs.
    pub outputs: Vec<TxOutput>,
    /// Lock time.
    pub lock_time: u32,
}

impl Transaction {
    /// Consensus encoding: version, time, inputs, outputs, lock time,
    /// all little-endian with compact-size prefixed vectors.
    pub fn consensus_encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.time.to_le_bytes());
        out.extend_from_slice(&compact_size(self.inputs.len() as u64));
        for input in &self.inputs {
            out.extend_from_slice(input.prevout.txid.as_bytes());
            out.extend_from_slice(&input.prevout.vout.to_le_bytes());
            out.extend_from_slice(&compact_size(input.script_sig.len() as u64));
            out.extend_from_slice(input.script_sig.as_bytes());
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }
        out.extend_from_slice(&compact_size(self.outputs.len() as u64));
        for output in &self.outputs {
            out.extend_from_slice(&output.value.to_le_bytes());
            out.extend_from_slice(&compact_size(output.script_pubkey.len() as u64));
            out.extend_from_slice(output.script_pubkey.as_bytes());
        }
        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out
    }

    /// Transaction id: double-SHA256 over the consensus encoding.
    pub fn txid(&self) -> Hash256 {
        sha256d(&self.consensus_encode())
    }

    /// Whether this is a coinbase: a single input spending the null
    /// outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }

    /// Whether this is a coinstake: spends a real outpoint and its
    /// first output is the empty marker.
    pub fn is_coinstake(&self) -> bool {
        !self.inputs.is_empty()
            && !self.inputs[0].prevout.is_null()
            && self.outputs.len() >= 2
            && self.outputs[0].is_empty_marker()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_outpoint() -> OutPoint {
        OutPoint {
            txid: sha256d(b"funding"),
            vout: 1,
        }
    }

    fn coinstake_tx() -> Transaction {
        Transaction {
            version: 1,
            time: 1_600_000_000,
            inputs: vec![TxInput {
                prevout: sample_outpoint(),
                script_sig: Script::from(&[0x51][..]),
                sequence: u32::MAX,
            }],
            outputs: vec![
                TxOutput::empty(),
                TxOutput {
                    value: 10 * crate::COIN,
                    script_pubkey: Script::from(&[0x52][..]),
                },
            ],
            lock_time: 0,
        }
    }

    #[test]
    fn test_coinstake_detection() {
        let tx = coinstake_tx();
        assert!(tx.is_coinstake());
        assert!(!tx.is_coinbase());
    }

    #[test]
    fn test_coinbase_detection() {
        let tx = Transaction {
            version: 1,
            time: 0,
            inputs: vec![TxInput {
                prevout: OutPoint::null(),
                script_sig: Script::default(),
                sequence: u32::MAX,
            }],
            outputs: vec![TxOutput {
                value: 0,
                script_pubkey: Script::default(),
            }],
            lock_time: 0,
        };
        assert!(tx.is_coinbase());
        assert!(!tx.is_coinstake());
    }

    #[test]
    fn test_coinstake_requires_empty_first_output() {
        let mut tx = coinstake_tx();
        tx.outputs[0].value = 1;
        assert!(!tx.is_coinstake());
    }

    #[test]
    fn test_txid_changes_with_time() {
        let tx = coinstake_tx();
        let mut later = tx.clone();
        later.time += 1;
        assert_ne!(tx.txid(), later.txid());
    }

    #[test]
    fn test_encoding_is_stable() {
        let tx = coinstake_tx();
        assert_eq!(tx.consensus_encode(), tx.consensus_encode());
        // version(4) + time(4) + input count(1) + input(36 + 1 + 1 + 4)
        // + output count(1) + empty output(8 + 1) + value output(8 + 1 + 1)
        // + lock time(4)
        assert_eq!(tx.consensus_encode().len(), 4 + 4 + 1 + 42 + 1 + 9 + 10 + 4);
    }
}
