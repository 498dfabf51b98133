//! Error types for the minter.

use thiserror::Error;

/// Minter errors. The loop logs and continues on all of these; only
/// shutdown stops it.
#[derive(Error, Debug)]
pub enum MinterError {
    /// The block assembler could not build a candidate.
    #[error("block creation failed: {0}")]
    BlockCreation(String),

    /// The node rejected a submitted block.
    #[error("block rejected: {0}")]
    Rejected(String),

    /// Signing the candidate failed.
    #[error("failed to sign block")]
    SigningFailed,
}

/// Result type for minter operations.
pub type MinterResult<T> = Result<T, MinterError>;
