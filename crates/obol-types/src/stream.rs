//! Little-endian hash streaming.
//!
//! Consensus hashes are computed over a stream of little-endian scalars,
//! raw hash bytes and length-prefixed byte strings, finalized with
//! double-SHA256. The field order at every call site is consensus
//! critical.

use crate::hash::Hash256;
use sha2::{Digest, Sha256};

/// Incremental writer producing a double-SHA256 over a little-endian
/// byte stream.
pub struct HashWriter {
    inner: Sha256,
}

impl Default for HashWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl HashWriter {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    /// Append a `u32` in little-endian order.
    pub fn write_u32(&mut self, value: u32) {
        self.inner.update(value.to_le_bytes());
    }

    /// Append a `u64` in little-endian order.
    pub fn write_u64(&mut self, value: u64) {
        self.inner.update(value.to_le_bytes());
    }

    /// Append an `i32` in little-endian order.
    pub fn write_i32(&mut self, value: i32) {
        self.inner.update(value.to_le_bytes());
    }

    /// Append an `i64` in little-endian order.
    pub fn write_i64(&mut self, value: i64) {
        self.inner.update(value.to_le_bytes());
    }

    /// Append a hash in its internal byte order.
    pub fn write_hash(&mut self, hash: &Hash256) {
        self.inner.update(hash.as_bytes());
    }

    /// Append a compact-size length prefix.
    pub fn write_compact_size(&mut self, len: u64) {
        self.inner.update(compact_size(len));
    }

    /// Append a length-prefixed byte string.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_compact_size(bytes.len() as u64);
        self.inner.update(bytes);
    }

    /// Finalize the stream with double-SHA256.
    pub fn finalize(self) -> Hash256 {
        let first = self.inner.finalize();
        let second = Sha256::digest(first);
        let mut out = [0u8; 32];
        out.copy_from_slice(&second);
        Hash256(out)
    }
}

/// Encode a Bitcoin compact-size integer.
pub(crate) fn compact_size(len: u64) -> Vec<u8> {
    if len < 253 {
        vec![len as u8]
    } else if len <= 0xffff {
        let mut out = vec![253u8];
        out.extend_from_slice(&(len as u16).to_le_bytes());
        out
    } else if len <= 0xffff_ffff {
        let mut out = vec![254u8];
        out.extend_from_slice(&(len as u32).to_le_bytes());
        out
    } else {
        let mut out = vec![255u8];
        out.extend_from_slice(&len.to_le_bytes());
        out
    }
}
