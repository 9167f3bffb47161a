// File: src/services/reward_selector.rs

use parking_lot::RwLock;
use rand::Rng;

use spinwheel_common::error::Error;
use spinwheel_common::models::reward::RewardDistribution;

/// Weighted discrete sampler over the configured wheel. The distribution is
/// read fresh on every draw, so `reconfigure` takes effect for subsequent
/// calls only, never for one in flight.
pub struct RewardSelector {
    distribution: RwLock<RewardDistribution>,
}

impl RewardSelector {
    pub fn new(distribution: RewardDistribution) -> Result<Self, Error> {
        distribution.validate()?;
        Ok(Self { distribution: RwLock::new(distribution) })
    }

    /// Swap in a new distribution atomically. In-flight draws keep the old
    /// weights; later draws see the new ones.
    pub fn reconfigure(&self, distribution: RewardDistribution) -> Result<(), Error> {
        distribution.validate()?;
        *self.distribution.write() = distribution;
        Ok(())
    }

    pub fn current(&self) -> RewardDistribution {
        self.distribution.read().clone()
    }

    /// Draw one reward with the process RNG.
    pub fn sample(&self) -> Result<i32, Error> {
        self.sample_with(&mut rand::rng())
    }

    /// Draw one reward from an explicit RNG. Each call is an independent
    /// sample; zero-weight tiers are never selectable.
    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<i32, Error> {
        let dist = self.distribution.read();
        let total = dist.total_weight();
        if total == 0 {
            return Err(Error::Configuration(
                "reward distribution has no positive-weight tiers".to_string(),
            ));
        }

        let mut roll = rng.random_range(0..total);
        for tier in dist.active_tiers() {
            let weight = tier.weight as u64;
            if roll < weight {
                return Ok(tier.amount);
            }
            roll -= weight;
        }

        // total > 0 guarantees the walk above returns.
        Err(Error::Configuration(
            "weighted sampling walked past the total weight".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use spinwheel_common::models::reward::RewardTier;
    use std::collections::HashMap;

    #[test]
    fn zero_weight_tiers_are_never_drawn() {
        let selector = RewardSelector::new(RewardDistribution::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let amount = selector.sample_with(&mut rng).unwrap();
            assert!(
                matches!(amount, 1 | 5 | 10),
                "disabled segment {amount} was drawn"
            );
        }
    }

    #[test]
    fn frequencies_converge_to_weight_fractions() {
        let selector = RewardSelector::new(RewardDistribution::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let draws = 70_000usize;
        let mut counts: HashMap<i32, usize> = HashMap::new();
        for _ in 0..draws {
            *counts.entry(selector.sample_with(&mut rng).unwrap()).or_default() += 1;
        }

        let expect = |amount: i32, weight: f64| {
            let observed = *counts.get(&amount).unwrap_or(&0) as f64 / draws as f64;
            let expected = weight / 70.0;
            assert!(
                (observed - expected).abs() < 0.015,
                "amount {amount}: observed {observed:.4}, expected {expected:.4}"
            );
        };
        expect(1, 25.0);
        expect(5, 25.0);
        expect(10, 20.0);
    }

    #[test]
    fn all_zero_distribution_is_a_configuration_error() {
        let dist = RewardDistribution::new(vec![RewardTier { amount: 5, weight: 0 }]);
        assert!(matches!(RewardSelector::new(dist), Err(Error::Configuration(_))));
    }

    #[test]
    fn reconfigure_applies_to_subsequent_draws() {
        let selector = RewardSelector::new(RewardDistribution::default()).unwrap();
        selector
            .reconfigure(RewardDistribution::new(vec![RewardTier { amount: 30, weight: 1 }]))
            .unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(selector.sample_with(&mut rng).unwrap(), 30);
        }
    }

    #[test]
    fn reconfigure_rejects_all_zero_weights() {
        let selector = RewardSelector::new(RewardDistribution::default()).unwrap();
        let bad = RewardDistribution::new(vec![RewardTier { amount: 1, weight: 0 }]);
        assert!(selector.reconfigure(bad).is_err());
        // The previous distribution stays in effect.
        assert!(selector.sample_with(&mut StdRng::seed_from_u64(3)).is_ok());
    }
}
