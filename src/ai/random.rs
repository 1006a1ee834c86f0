use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::agent::OpponentPolicy;
use crate::error::ApproximatorError;

/// A policy that selects uniformly at random among `action_count` actions.
pub struct RandomPolicy {
    action_count: usize,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(action_count: usize, seed: u64) -> Self {
        RandomPolicy {
            action_count,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample(&mut self) -> usize {
        self.rng.random_range(0..self.action_count)
    }
}

impl OpponentPolicy for RandomPolicy {
    fn predict(&mut self, _observation: &[f64]) -> Result<usize, ApproximatorError> {
        Ok(self.sample())
    }

    fn name(&self) -> &str {
        "Random"
    }
}
