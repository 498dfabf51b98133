//! Entropy bit extraction.
//!
//! Every block contributes one entropy bit to future stake modifiers.
//! Under v0.4+ the bit is the lowest bit of the block hash; before that
//! it came from the block signature.

use crate::eras::{Era, EraFlags};
use obol_types::{hash160, Block};
use tracing::trace;

/// The entropy bit a block contributes to the stake modifier.
pub fn stake_entropy_bit(eras: EraFlags, block: &Block) -> u32 {
    if eras.contains(Era::V04) {
        let bit = (block.header.hash().low_u64() & 1) as u32;
        trace!(time = block.header.time, bit, "entropy bit from block hash");
        bit
    } else {
        // pre-v0.4: first bit of the signature's hash160
        let sig_hash = hash160(&block.signature);
        let bit = u32::from(sig_hash.as_bytes()[19] >> 7);
        trace!(time = block.header.time, bit, "entropy bit from block signature");
        bit
    }
}
