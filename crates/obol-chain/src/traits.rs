//! Collaborator interfaces.
//!
//! The consensus core consumes these seams but never implements them;
//! the surrounding node provides block files, script execution, the
//! UTXO set and network-adjusted time.

use obol_types::{Amount, BlockHeader, Hash256, OutPoint, Script, Transaction, TxOutput};

/// A located transaction: the header of its containing block and the
/// byte offset of the transaction after that header.
#[derive(Clone, Debug)]
pub struct TxRecord {
    /// Header of the containing block.
    pub header: BlockHeader,
    /// Byte offset of the transaction within the block body, measured
    /// after the fixed header.
    pub offset: u32,
    /// The transaction itself.
    pub tx: Transaction,
}

/// Transaction lookup backed by the block files. Must stay consistent
/// with them; externally synchronized.
pub trait TransactionIndex: Send + Sync {
    /// Locate a transaction by id.
    fn find(&self, txid: &Hash256) -> Option<TxRecord>;
}

/// Script interpreter seam used to verify coinstake signatures.
pub trait ScriptVerifier: Send + Sync {
    /// Verify input `input` of `tx` against the output it spends.
    fn verify_input(&self, tx: &Transaction, input: usize, prev_out: &TxOutput) -> bool;
}

/// One unspent output.
#[derive(Clone, Debug)]
pub struct Coin {
    /// The output.
    pub output: TxOutput,
    /// Height of the block that created it.
    pub height: u32,
}

impl Coin {
    /// Value of the coin.
    pub fn value(&self) -> Amount {
        self.output.value
    }

    /// Whether the coin pays the given script.
    pub fn pays_to(&self, script: &Script) -> bool {
        self.output.script_pubkey == *script
    }
}

/// Iterable snapshot of the UTXO set.
pub trait CoinsView: Send + Sync {
    /// Iterate all unspent outputs.
    fn iter(&self) -> Box<dyn Iterator<Item = (OutPoint, Coin)> + '_>;
}

/// Network-adjusted clock.
pub trait Clock: Send + Sync {
    /// Seconds since epoch, adjusted by the peer-median offset.
    fn adjusted_time(&self) -> i64;
}
