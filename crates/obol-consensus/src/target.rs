//! Compact difficulty targets.
//!
//! The header's `bits` field is the Bitcoin compact encoding: one size
//! byte and a 23-bit mantissa. Consensus math decodes it into a full
//! 256-bit integer; never into a float.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

/// Decode a compact target into its 256-bit value.
///
/// The sign bit (0x00800000) never appears in real targets and decodes
/// as an ordinary mantissa bit cleared by the encoder.
pub fn compact_to_target(bits: u32) -> BigUint {
    let size = bits >> 24;
    let mantissa = bits & 0x007f_ffff;
    if size <= 3 {
        BigUint::from(mantissa >> (8 * (3 - size)))
    } else {
        BigUint::from(mantissa) << (8 * (size - 3)) as usize
    }
}

/// Encode a 256-bit target into compact form, normalizing the mantissa
/// so its sign bit stays clear.
pub fn target_to_compact(target: &BigUint) -> u32 {
    if target.is_zero() {
        return 0;
    }
    let mut size = ((target.bits() + 7) / 8) as u32;
    let mut compact: u32 = if size <= 3 {
        (target.to_u64().unwrap_or(0) as u32) << (8 * (3 - size))
    } else {
        let shifted: BigUint = target >> (8 * (size - 3)) as usize;
        shifted.to_u64().unwrap_or(0) as u32
    };
    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }
    compact | (size << 24)
}
