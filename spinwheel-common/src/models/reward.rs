// File: spinwheel-common/src/models/reward.rs

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One wheel segment: a reward amount and its selection weight. A weight of
/// zero keeps the segment visible on the wheel but never selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTier {
    pub amount: i32,
    pub weight: u32,
}

/// The full weighted wheel configuration. Read fresh per draw; each draw is
/// an independent sample, not a shuffled deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDistribution {
    pub tiers: Vec<RewardTier>,
}

impl RewardDistribution {
    pub fn new(tiers: Vec<RewardTier>) -> Self {
        Self { tiers }
    }

    /// At least one tier must carry positive weight for sampling to work.
    pub fn validate(&self) -> Result<(), Error> {
        if self.total_weight() == 0 {
            return Err(Error::Configuration(
                "reward distribution has no positive-weight tiers".to_string(),
            ));
        }
        Ok(())
    }

    pub fn total_weight(&self) -> u64 {
        self.tiers.iter().map(|t| t.weight as u64).sum()
    }

    /// Tiers that can actually be drawn.
    pub fn active_tiers(&self) -> impl Iterator<Item = &RewardTier> {
        self.tiers.iter().filter(|t| t.weight > 0)
    }
}

impl Default for RewardDistribution {
    /// The 12-segment wheel: only the three small amounts are enabled by
    /// default, the rest are disabled segments.
    fn default() -> Self {
        Self::new(vec![
            RewardTier { amount: 1, weight: 25 },
            RewardTier { amount: 5, weight: 25 },
            RewardTier { amount: 10, weight: 20 },
            RewardTier { amount: 15, weight: 0 },
            RewardTier { amount: 20, weight: 0 },
            RewardTier { amount: 25, weight: 0 },
            RewardTier { amount: 30, weight: 0 },
            RewardTier { amount: 40, weight: 0 },
            RewardTier { amount: 50, weight: 0 },
            RewardTier { amount: 60, weight: 0 },
            RewardTier { amount: 75, weight: 0 },
            RewardTier { amount: 100, weight: 0 },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_wheel_has_three_active_tiers() {
        let dist = RewardDistribution::default();
        assert_eq!(dist.tiers.len(), 12);
        assert_eq!(dist.active_tiers().count(), 3);
        assert_eq!(dist.total_weight(), 70);
        assert!(dist.validate().is_ok());
    }

    #[test]
    fn all_zero_weights_fail_validation() {
        let dist = RewardDistribution::new(vec![
            RewardTier { amount: 5, weight: 0 },
            RewardTier { amount: 10, weight: 0 },
        ]);
        assert!(matches!(dist.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn empty_distribution_fails_validation() {
        assert!(RewardDistribution::new(vec![]).validate().is_err());
    }
}
