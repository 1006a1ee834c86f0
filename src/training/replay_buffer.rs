use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::ai::Transition;
use crate::error::ReplayError;

/// Fixed-capacity ring buffer of transitions with uniform sampling.
///
/// Once full, each append overwrites the chronologically oldest transition.
pub struct ReplayBuffer {
    buffer: Vec<Transition>,
    capacity: usize,
    position: usize,
    rng: StdRng,
}

impl ReplayBuffer {
    /// A zero capacity is treated as 1.
    pub fn new(capacity: usize, seed: u64) -> Self {
        let capacity = capacity.max(1);
        ReplayBuffer {
            buffer: Vec::with_capacity(capacity),
            capacity,
            position: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Add a transition, evicting the oldest when full.
    pub fn append(&mut self, transition: Transition) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
        } else {
            self.buffer[self.position] = transition;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Draw `k` distinct transitions uniformly at random.
    pub fn sample(&mut self, k: usize) -> Result<Vec<Transition>, ReplayError> {
        if k > self.buffer.len() {
            return Err(ReplayError::InsufficientData {
                requested: k,
                available: self.buffer.len(),
            });
        }
        let indices = index::sample(&mut self.rng, self.buffer.len(), k);
        Ok(indices.iter().map(|i| self.buffer[i].clone()).collect())
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
