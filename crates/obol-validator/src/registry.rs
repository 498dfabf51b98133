//! The validator registry.
//!
//! One writer-exclusive lock protects the validator map; read
//! accessors copy data out rather than hand back references. Selection
//! holds the lock for the whole weighted draw.

use crate::error::{ValidatorError, ValidatorResult};
use crate::reputation::ValidatorReputation;
use obol_types::{Amount, Hash256, HashWriter, Script, COIN};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Minimum stake required to register as a validator (32 coins).
pub const VALIDATOR_MIN_STAKE: Amount = 32 * COIN;

/// Unique validator identifier: hash of the validator's script.
pub type ValidatorId = Hash256;

/// Derive a validator id from its script.
pub fn validator_id(script: &Script) -> ValidatorId {
    let mut writer = HashWriter::new();
    writer.write_var_bytes(script.as_bytes());
    writer.finalize()
}

/// Validator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorStatus {
    /// Registered but not yet producing.
    Inactive,
    /// Eligible for selection.
    Active,
    /// Punitively removed; never eligible again.
    Slashed,
    /// Leaving the set; kept in the registry through the cooldown.
    PendingExit,
}

/// A registered validator.
#[derive(Debug, Clone)]
pub struct Validator {
    /// Identifier, the hash of `script_pubkey`.
    pub id: ValidatorId,
    /// The validator's payout script.
    pub script_pubkey: Script,
    /// Amount staked, in satoshi units.
    pub staked_amount: Amount,
    /// Lifecycle state.
    pub status: ValidatorStatus,
    /// Reputation metrics.
    pub reputation: ValidatorReputation,
    /// Registration timestamp.
    pub registration_time: i64,
}

impl Validator {
    /// Create a validator in the `Inactive` state.
    pub fn new(script_pubkey: Script, staked_amount: Amount, registration_time: i64) -> Self {
        let id = validator_id(&script_pubkey);
        Validator {
            id,
            script_pubkey,
            staked_amount,
            status: ValidatorStatus::Inactive,
            reputation: ValidatorReputation::default(),
            registration_time,
        }
    }

    /// Whether the stake meets the registration minimum.
    pub fn meets_minimum_stake(&self) -> bool {
        self.staked_amount >= VALIDATOR_MIN_STAKE
    }

    /// Activate the validator, starting the active-time clock.
    pub fn activate(&mut self, activation_time: i64) {
        self.status = ValidatorStatus::Active;
        if self.reputation.first_active == 0 {
            self.reputation.first_active = activation_time;
        }
        self.reputation.last_active = activation_time;
    }

    /// Deactivate the validator, accumulating its active time.
    pub fn deactivate(&mut self, deactivation_time: i64) {
        if self.status == ValidatorStatus::Active {
            self.reputation.total_active += deactivation_time - self.reputation.last_active;
        }
        self.status = ValidatorStatus::Inactive;
    }

    /// Slash the validator, deducting `ratio` of its stake and marking
    /// it permanently ineligible. Returns the slashed amount for
    /// redistribution or burn.
    pub fn slash(&mut self, _slash_time: i64, ratio: f64) -> Amount {
        self.reputation.slashable_offenses += 1;
        self.reputation.update_score();
        let slashed = (self.staked_amount as f64 * ratio) as Amount;
        self.staked_amount -= slashed;
        self.status = ValidatorStatus::Slashed;
        slashed
    }

    /// Selection weight: stake in whole coins scaled by reputation.
    fn selection_weight(&self) -> u64 {
        let reputation_factor = (self.reputation.score / 10) as i64; // 0..=10
        ((self.staked_amount / COIN) * (reputation_factor + 1)).max(0) as u64
    }
}

/// Registry of all known validators.
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: RwLock<HashMap<ValidatorId, Validator>>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered validators, in any state.
    pub fn len(&self) -> usize {
        self.validators.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.validators.read().is_empty()
    }

    /// Register a new validator. Fails below the minimum stake.
    pub fn register(
        &self,
        script_pubkey: Script,
        staked_amount: Amount,
        registration_time: i64,
    ) -> ValidatorResult<ValidatorId> {
        let validator = Validator::new(script_pubkey, staked_amount, registration_time);
        if !validator.meets_minimum_stake() {
            warn!(
                staked = staked_amount,
                minimum = VALIDATOR_MIN_STAKE,
                "validator registration below minimum stake"
            );
            return Err(ValidatorError::InsufficientStake {
                staked: staked_amount,
                minimum: VALIDATOR_MIN_STAKE,
            });
        }
        let id = validator.id;
        self.validators.write().insert(id, validator);
        info!(validator = %id, staked = staked_amount, "validator registered");
        Ok(id)
    }

    /// Transition a validator to `PendingExit`. The entry stays in the
    /// registry through the exit cooldown.
    pub fn remove(&self, id: &ValidatorId) -> ValidatorResult<()> {
        let mut validators = self.validators.write();
        let validator = validators
            .get_mut(id)
            .ok_or(ValidatorError::NotFound(*id))?;
        validator.status = ValidatorStatus::PendingExit;
        info!(validator = %id, "validator pending exit");
        Ok(())
    }

    /// Copy of a validator by id.
    pub fn get(&self, id: &ValidatorId) -> Option<Validator> {
        self.validators.read().get(id).cloned()
    }

    /// Copy of a validator by payout script.
    pub fn find_by_script(&self, script: &Script) -> Option<Validator> {
        self.validators
            .read()
            .values()
            .find(|v| v.script_pubkey == *script)
            .cloned()
    }

    /// Copies of all active validators.
    pub fn active_validators(&self) -> Vec<Validator> {
        self.validators
            .read()
            .values()
            .filter(|v| v.status == ValidatorStatus::Active)
            .cloned()
            .collect()
    }

    /// Activate a validator.
    pub fn activate(&self, id: &ValidatorId, activation_time: i64) -> ValidatorResult<()> {
        let mut validators = self.validators.write();
        let validator = validators
            .get_mut(id)
            .ok_or(ValidatorError::NotFound(*id))?;
        validator.activate(activation_time);
        Ok(())
    }

    /// Deactivate a validator.
    pub fn deactivate(&self, id: &ValidatorId, deactivation_time: i64) -> ValidatorResult<()> {
        let mut validators = self.validators.write();
        let validator = validators
            .get_mut(id)
            .ok_or(ValidatorError::NotFound(*id))?;
        validator.deactivate(deactivation_time);
        Ok(())
    }

    /// Select the block producer for a slot.
    ///
    /// Weighted-random over the active set, with weight
    /// `(stake / COIN) * (score / 10 + 1)`. The draw is seeded from
    /// `H(prev_hash ++ timestamp)` so every node computes the same
    /// schedule; a non-deterministic draw here would let each node
    /// believe in a different producer.
    pub fn select_next_validator(
        &self,
        prev_hash: &Hash256,
        timestamp: i64,
    ) -> Option<Validator> {
        let validators = self.validators.read();
        // canonical id order: the cumulative-weight walk must visit
        // validators identically on every node
        let mut active: Vec<&Validator> = validators
            .values()
            .filter(|v| v.status == ValidatorStatus::Active)
            .collect();
        active.sort_by(|a, b| a.id.numeric_cmp(&b.id));
        let weights: Vec<u64> = active.iter().map(|v| v.selection_weight()).collect();
        let total_weight: u64 = weights.iter().sum();
        if active.is_empty() || total_weight == 0 {
            return None;
        }

        let mut hasher = HashWriter::new();
        hasher.write_hash(prev_hash);
        hasher.write_i64(timestamp);
        let seed = hasher.finalize();
        let draw = seed.low_u64() % total_weight;

        let mut cumulative = 0u64;
        for (validator, weight) in active.iter().zip(&weights) {
            cumulative += weight;
            if draw < cumulative {
                debug!(validator = %validator.id, draw, total_weight, "selected validator");
                return Some((*validator).clone());
            }
        }
        // unreachable with a non-zero total weight
        active.last().map(|v| (*v).clone())
    }

    /// Record the outcome of a slot for a validator and refresh its
    /// score.
    pub fn update_reputation(&self, id: &ValidatorId, produced_block: bool) {
        let mut validators = self.validators.write();
        let Some(validator) = validators.get_mut(id) else {
            return;
        };
        if produced_block {
            validator.reputation.blocks_produced += 1;
        } else {
            validator.reputation.blocks_missed += 1;
        }
        validator.reputation.update_score();
    }

    /// Slash a validator, returning the deducted amount.
    pub fn slash(
        &self,
        id: &ValidatorId,
        slash_time: i64,
        ratio: f64,
    ) -> ValidatorResult<Amount> {
        let mut validators = self.validators.write();
        let validator = validators
            .get_mut(id)
            .ok_or(ValidatorError::NotFound(*id))?;
        let slashed = validator.slash(slash_time, ratio);
        warn!(validator = %id, slashed, "validator slashed");
        Ok(slashed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obol_types::sha256d;

    fn script(tag: u8) -> Script {
        Script::from(vec![0x76, 0xa9, tag])
    }

    #[test]
    fn test_register_at_minimum() {
        let registry = ValidatorRegistry::new();
        let id = registry.register(script(1), 32 * COIN, 1_000).unwrap();
        let validator = registry.get(&id).unwrap();
        assert_eq!(validator.status, ValidatorStatus::Inactive);
        assert_eq!(validator.id, validator_id(&script(1)));
        assert_eq!(validator.staked_amount, 32 * COIN);
        assert_eq!(validator.registration_time, 1_000);
    }

    #[test]
    fn test_register_below_minimum_rejected() {
        let registry = ValidatorRegistry::new();
        let err = registry.register(script(1), 32 * COIN - 1, 1_000).unwrap_err();
        assert!(matches!(err, ValidatorError::InsufficientStake { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_slash_deducts_and_marks() {
        let registry = ValidatorRegistry::new();
        let id = registry.register(script(1), 100 * COIN, 0).unwrap();
        let slashed = registry.slash(&id, 5_000, 0.1).unwrap();
        assert_eq!(slashed, 10 * COIN);
        let validator = registry.get(&id).unwrap();
        assert_eq!(validator.staked_amount, 90 * COIN);
        assert_eq!(validator.status, ValidatorStatus::Slashed);
        assert_eq!(validator.reputation.slashable_offenses, 1);
    }

    #[test]
    fn test_remove_keeps_entry() {
        let registry = ValidatorRegistry::new();
        let id = registry.register(script(1), 32 * COIN, 0).unwrap();
        registry.remove(&id).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(&id).unwrap().status,
            ValidatorStatus::PendingExit
        );
    }

    #[test]
    fn test_selection_single_validator() {
        let registry = ValidatorRegistry::new();
        let id = registry.register(script(1), 32 * COIN, 0).unwrap();
        registry.activate(&id, 0).unwrap();
        for salt in 0u32..8 {
            let prev = sha256d(&salt.to_le_bytes());
            let selected = registry.select_next_validator(&prev, salt as i64).unwrap();
            assert_eq!(selected.id, id);
        }
    }

    #[test]
    fn test_selection_none_without_active() {
        let registry = ValidatorRegistry::new();
        assert!(registry
            .select_next_validator(&sha256d(b"seed"), 0)
            .is_none());
        // inactive validators do not count
        registry.register(script(1), 32 * COIN, 0).unwrap();
        assert!(registry
            .select_next_validator(&sha256d(b"seed"), 0)
            .is_none());
    }

    #[test]
    fn test_selection_zero_weight_returns_none() {
        let registry = ValidatorRegistry::new();
        let id = registry.register(script(1), 32 * COIN, 0).unwrap();
        registry.activate(&id, 0).unwrap();
        // slash the stake to dust so the weight rounds to zero
        {
            let mut validators = registry.validators.write();
            let validator = validators.get_mut(&id).unwrap();
            validator.staked_amount = COIN - 1;
            validator.status = ValidatorStatus::Active;
        }
        assert!(registry
            .select_next_validator(&sha256d(b"seed"), 0)
            .is_none());
    }

    #[test]
    fn test_selection_is_deterministic() {
        let registry = ValidatorRegistry::new();
        for tag in 0..5u8 {
            let id = registry
                .register(script(tag), (32 + tag as i64 * 10) * COIN, 0)
                .unwrap();
            registry.activate(&id, 0).unwrap();
        }
        let prev = sha256d(b"tip");
        let first = registry.select_next_validator(&prev, 42).unwrap();
        for _ in 0..10 {
            let again = registry.select_next_validator(&prev, 42).unwrap();
            assert_eq!(again.id, first.id);
        }
        // a different slot may pick someone else, but must also be stable
        let other = registry.select_next_validator(&prev, 43).unwrap();
        assert_eq!(
            other.id,
            registry.select_next_validator(&prev, 43).unwrap().id
        );
    }

    #[test]
    fn test_update_reputation_counts() {
        let registry = ValidatorRegistry::new();
        let id = registry.register(script(1), 32 * COIN, 0).unwrap();
        registry.update_reputation(&id, true);
        registry.update_reputation(&id, false);
        let validator = registry.get(&id).unwrap();
        assert_eq!(validator.reputation.blocks_produced, 1);
        assert_eq!(validator.reputation.blocks_missed, 1);
        assert!(validator.reputation.score >= 0 && validator.reputation.score <= 100);
    }

    #[test]
    fn test_activate_deactivate_tracks_time() {
        let registry = ValidatorRegistry::new();
        let id = registry.register(script(1), 32 * COIN, 0).unwrap();
        registry.activate(&id, 1_000).unwrap();
        let validator = registry.get(&id).unwrap();
        assert_eq!(validator.reputation.first_active, 1_000);
        registry.deactivate(&id, 1_600).unwrap();
        let validator = registry.get(&id).unwrap();
        assert_eq!(validator.status, ValidatorStatus::Inactive);
        assert_eq!(validator.reputation.total_active, 600);
    }
}
