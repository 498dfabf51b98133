//! Error types for the validator registry.

use obol_types::{Amount, Hash256};
use thiserror::Error;

/// Validator registry errors.
#[derive(Error, Debug)]
pub enum ValidatorError {
    /// Registration below the minimum stake.
    #[error("staked amount {staked} below minimum {minimum}")]
    InsufficientStake { staked: Amount, minimum: Amount },

    /// No validator with the given id.
    #[error("validator not found: {0}")]
    NotFound(Hash256),
}

/// Result type for validator operations.
pub type ValidatorResult<T> = Result<T, ValidatorError>;
