//! # obol-tests
//!
//! Integration tests for the Obol proof-of-stake core.
//!
//! This crate provides:
//! - A chain harness building synthetic block indices through the real
//!   modifier engine
//! - Mock collaborators for the minter loop
//! - Consensus, validator and minter integration tests
//! - Property-based tests for consensus invariants

pub mod harness;

#[cfg(test)]
mod consensus_tests;


#[cfg(test)]
mod property_tests;


pub use harness::*;
