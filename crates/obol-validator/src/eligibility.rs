//! Validator eligibility checks.
//!
//! Registry state alone is not enough to produce blocks: the stake has
//! to still exist. The UTXO scan is expensive, so it runs only at
//! eligibility time, never per selection round.

use crate::registry::{ValidatorId, ValidatorRegistry, ValidatorStatus, VALIDATOR_MIN_STAKE};
use obol_chain::CoinsView;
use obol_types::{Amount, Script};
use tracing::debug;

/// Sum the unspent outputs paying `script` and check the total against
/// the validator minimum.
pub fn verify_minimum_stake(coins: &dyn CoinsView, script: &Script) -> bool {
    let mut total: Amount = 0;
    for (_, coin) in coins.iter() {
        if coin.pays_to(script) {
            total += coin.value();
        }
    }
    if total < VALIDATOR_MIN_STAKE {
        debug!(
            total,
            minimum = VALIDATOR_MIN_STAKE,
            "stake below minimum in UTXO set"
        );
        return false;
    }
    true
}

/// Whether a validator may produce blocks: active, never slashed,
/// registered stake at the minimum, and that stake still present in
/// the UTXO set (a spent stake must not keep minting).
pub fn is_validator_eligible(
    registry: &ValidatorRegistry,
    coins: &dyn CoinsView,
    id: &ValidatorId,
) -> bool {
    let Some(validator) = registry.get(id) else {
        debug!(validator = %id, "validator not in registry");
        return false;
    };
    if validator.status != ValidatorStatus::Active {
        debug!(validator = %id, status = ?validator.status, "validator not active");
        return false;
    }
    if validator.staked_amount < VALIDATOR_MIN_STAKE {
        debug!(validator = %id, staked = validator.staked_amount, "validator below minimum stake");
        return false;
    }
    if !verify_minimum_stake(coins, &validator.script_pubkey) {
        debug!(validator = %id, "validator stake not verified in UTXO set");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use obol_chain::Coin;
    use obol_types::{sha256d, OutPoint, TxOutput, COIN};

    struct StaticCoins(Vec<(OutPoint, Coin)>);

    impl CoinsView for StaticCoins {
        fn iter(&self) -> Box<dyn Iterator<Item = (OutPoint, Coin)> + '_> {
            Box::new(self.0.iter().cloned())
        }
    }

    fn utxo(tag: u8, value: Amount, script: &Script) -> (OutPoint, Coin) {
        (
            OutPoint {
                txid: sha256d(&[tag]),
                vout: 0,
            },
            Coin {
                output: TxOutput {
                    value,
                    script_pubkey: script.clone(),
                },
                height: 1,
            },
        )
    }

    fn script(tag: u8) -> Script {
        Script::from(vec![0x76, tag])
    }

    #[test]
    fn test_stake_summed_across_outputs() {
        let s = script(1);
        let coins = StaticCoins(vec![
            utxo(0, 20 * COIN, &s),
            utxo(1, 12 * COIN, &s),
            utxo(2, 100 * COIN, &script(2)), // someone else's coin
        ]);
        assert!(verify_minimum_stake(&coins, &s));

        let short = StaticCoins(vec![utxo(0, 20 * COIN, &s), utxo(1, 11 * COIN, &s)]);
        assert!(!verify_minimum_stake(&short, &s));
    }

    #[test]
    fn test_eligibility_requires_active_and_backed_stake() {
        let registry = ValidatorRegistry::new();
        let s = script(1);
        let id = registry.register(s.clone(), 32 * COIN, 0).unwrap();
        let backed = StaticCoins(vec![utxo(0, 32 * COIN, &s)]);

        // inactive: not eligible
        assert!(!is_validator_eligible(&registry, &backed, &id));

        registry.activate(&id, 0).unwrap();
        assert!(is_validator_eligible(&registry, &backed, &id));

        // stake spent out of the UTXO set: not eligible
        let unbacked = StaticCoins(vec![]);
        assert!(!is_validator_eligible(&registry, &unbacked, &id));
    }

    #[test]
    fn test_slashed_validator_never_eligible() {
        let registry = ValidatorRegistry::new();
        let s = script(1);
        let id = registry.register(s.clone(), 320 * COIN, 0).unwrap();
        registry.activate(&id, 0).unwrap();
        let backed = StaticCoins(vec![utxo(0, 320 * COIN, &s)]);
        assert!(is_validator_eligible(&registry, &backed, &id));

        registry.slash(&id, 100, 0.1).unwrap();
        assert!(!is_validator_eligible(&registry, &backed, &id));
    }

    #[test]
    fn test_unknown_validator_not_eligible() {
        let registry = ValidatorRegistry::new();
        let coins = StaticCoins(vec![]);
        assert!(!is_validator_eligible(&registry, &coins, &sha256d(b"nobody")));
    }
}
