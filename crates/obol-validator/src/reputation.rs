//! Validator reputation metrics.

/// Performance metrics and the derived reputation score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorReputation {
    /// Blocks successfully produced.
    pub blocks_produced: u32,
    /// Blocks missed when selected.
    pub blocks_missed: u32,
    /// Detected slashable offenses.
    pub slashable_offenses: u32,
    /// Derived score in `[0, 100]`.
    pub score: i16,
    /// First time this validator became active.
    pub first_active: i64,
    /// Last time this validator was active.
    pub last_active: i64,
    /// Total time spent active, in seconds.
    pub total_active: i64,
}

impl Default for ValidatorReputation {
    fn default() -> Self {
        ValidatorReputation {
            blocks_produced: 0,
            blocks_missed: 0,
            slashable_offenses: 0,
            score: 50, // start neutral
            first_active: 0,
            last_active: 0,
            total_active: 0,
        }
    }
}

impl ValidatorReputation {
    /// Recompute the score from the performance counters.
    ///
    /// Base 50; up to +30 for produced blocks, up to -20 for missed
    /// blocks, up to -50 for slashable offenses; clamped to `[0, 100]`.
    pub fn update_score(&mut self) {
        let mut score = 50i32;
        score += (self.blocks_produced / 10).min(30) as i32;
        score -= (self.blocks_missed / 5).min(20) as i32;
        score -= (self.slashable_offenses.saturating_mul(10)).min(50) as i32;
        self.score = score.clamp(0, 100) as i16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_neutral() {
        assert_eq!(ValidatorReputation::default().score, 50);
    }

    #[test]
    fn test_produced_blocks_raise_score() {
        let mut rep = ValidatorReputation {
            blocks_produced: 100,
            ..Default::default()
        };
        rep.update_score();
        assert_eq!(rep.score, 60);

        rep.blocks_produced = 1_000;
        rep.update_score();
        assert_eq!(rep.score, 80); // capped at +30
    }

    #[test]
    fn test_missed_blocks_lower_score() {
        let mut rep = ValidatorReputation {
            blocks_missed: 50,
            ..Default::default()
        };
        rep.update_score();
        assert_eq!(rep.score, 40);

        rep.blocks_missed = 1_000;
        rep.update_score();
        assert_eq!(rep.score, 30); // capped at -20
    }

    #[test]
    fn test_offenses_dominate() {
        let mut rep = ValidatorReputation {
            blocks_produced: 1_000,
            slashable_offenses: 5,
            ..Default::default()
        };
        rep.update_score();
        assert_eq!(rep.score, 30); // 50 + 30 - 50
    }

    #[test]
    fn test_score_clamped_to_range() {
        let mut rep = ValidatorReputation {
            blocks_missed: 1_000,
            slashable_offenses: 100,
            ..Default::default()
        };
        rep.update_score();
        assert_eq!(rep.score, 0);

        let mut rep = ValidatorReputation {
            blocks_produced: u32::MAX,
            ..Default::default()
        };
        rep.update_score();
        assert!(rep.score <= 100);
    }
}
