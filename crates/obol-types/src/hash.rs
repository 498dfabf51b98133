//! Hash types and the consensus hash functions.
//!
//! All consensus hashing is double-SHA256 over a little-endian byte
//! stream. Hashes are stored in their internal (little-endian) byte
//! order and displayed reversed, Bitcoin style.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fmt;

/// A 256-bit hash in internal (little-endian) byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash256(pub [u8; 32]);

/// A 160-bit hash (RIPEMD160 over SHA256).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash160(pub [u8; 20]);

impl Hash256 {
    /// The all-zero hash.
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    /// Raw internal bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// The low 64 bits of the hash interpreted as a little-endian
    /// 256-bit integer.
    pub fn low_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.0[0..8]);
        u64::from_le_bytes(bytes)
    }

    /// Compare two hashes as little-endian 256-bit integers.
    ///
    /// Equivalent to comparing 32-bit little-endian limbs from the most
    /// significant limb down, which is the tie-break order the stake
    /// modifier candidate sort requires.
    pub fn numeric_cmp(&self, other: &Hash256) -> Ordering {
        for i in (0..32).rev() {
            match self.0[i].cmp(&other.0[i]) {
                Ordering::Equal => continue,
                non_eq => return non_eq,
            }
        }
        Ordering::Equal
    }

    /// Parse from the reversed (display-order) hex string.
    pub fn from_hex(s: &str) -> Option<Hash256> {
        let raw = hex::decode(s).ok()?;
        if raw.len() != 32 {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, b) in raw.iter().rev().enumerate() {
            bytes[i] = *b;
        }
        Some(Hash256(bytes))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "{}", hex::encode(reversed))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({self})")
    }
}

impl Hash160 {
    /// Raw internal bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash160({self})")
    }
}

/// Double-SHA256 of the given bytes.
pub fn sha256d(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    Hash256(out)
}

/// RIPEMD160 of SHA256, the script-hash construction.
pub fn hash160(data: &[u8]) -> Hash160 {
    let sha = Sha256::digest(data);
    let rip = Ripemd160::digest(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&rip);
    Hash160(out)
}
