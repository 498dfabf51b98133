//! Error types for chain-state operations.

use obol_types::Hash256;
use thiserror::Error;

/// Chain-state errors.
#[derive(Error, Debug)]
pub enum ChainError {
    /// A block hash was not found in the index.
    #[error("block not indexed: {0}")]
    UnknownBlock(Hash256),

    /// A block was inserted twice.
    #[error("duplicate block: {0}")]
    DuplicateBlock(Hash256),

    /// The active chain would become non-contiguous.
    #[error("non-contiguous chain extension at height {height}, tip height {tip_height}")]
    NonContiguous { height: u32, tip_height: u32 },
}

/// Result type for chain-state operations.
pub type ChainResult<T> = Result<T, ChainError>;
