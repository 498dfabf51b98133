//! Error types for consensus validation.

use thiserror::Error;

/// Consensus validation errors.
///
/// `ModifierUnavailable` is the only locally recoverable kind: the
/// block is held, not rejected, until more blocks arrive. Everything
/// else propagates with a structured reject reason.
#[derive(Error, Debug)]
pub enum ConsensusError {
    /// Required data is not (yet) available: transaction index miss,
    /// unindexed block, out-of-range output.
    #[error("missing data: {0}")]
    MissingData(String),

    /// The stake kernel predicate failed: target miss, age violation,
    /// time violation.
    #[error("kernel check failed: {0}")]
    KernelCheckFailed(String),

    /// The modifier walk reached the tip before finding a usable
    /// modifier. Retry once more blocks are known.
    #[error("stake modifier unavailable: {0}")]
    ModifierUnavailable(String),

    /// Computed modifier checksum disagrees with a hard checkpoint.
    #[error("stake modifier checkpoint mismatch at height {height}: got {got:#010x}, want {want:#010x}")]
    CheckpointMismatch { height: u32, got: u32, want: u32 },

    /// Coinstake signature did not verify.
    #[error("script verify failed: {0}")]
    ScriptVerifyFailed(String),

    /// Block-file read failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;
