use std::path::{Path, PathBuf};

use super::agent::OpponentPolicy;
use super::algorithms::DqnAgent;
use super::approximator::{argmax, ValueApproximator};
use super::random::RandomPolicy;
use crate::error::ApproximatorError;

/// Captured approximator weights plus the step count at capture time.
#[derive(Debug, Clone)]
pub struct OpponentSnapshot<W> {
    weights: W,
    step: u64,
    path: Option<PathBuf>,
}

impl<W> OpponentSnapshot<W> {
    pub fn new(weights: W, step: u64) -> Self {
        OpponentSnapshot {
            weights,
            step,
            path: None,
        }
    }

    /// Record where the snapshot was persisted.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn weights(&self) -> &W {
        &self.weights
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Holds the current best self-play snapshot, if any, and answers opponent
/// action queries with it.
///
/// Promotion is unconditional here; deciding whether a candidate deserves
/// promotion is the trainer's job.
pub struct SelfPlayRegistry<Q: ValueApproximator> {
    policy: Q,
    current: Option<OpponentSnapshot<Q::Weights>>,
    fallback: RandomPolicy,
    promotions: usize,
}

impl<Q: ValueApproximator> SelfPlayRegistry<Q> {
    /// `policy` is a scratch approximator the held snapshot is loaded into.
    pub fn new(policy: Q, seed: u64) -> Self {
        let fallback = RandomPolicy::new(policy.action_count(), seed);
        SelfPlayRegistry {
            policy,
            current: None,
            fallback,
            promotions: 0,
        }
    }

    /// Replace the held snapshot wholesale.
    pub fn promote(&mut self, snapshot: OpponentSnapshot<Q::Weights>) {
        self.policy.set_weights(snapshot.weights.clone());
        self.current = Some(snapshot);
        self.promotions += 1;
    }

    /// Restart the random fallback from `seed`, so an examination against an
    /// empty registry is reproducible.
    pub fn reseed_fallback(&mut self, seed: u64) {
        self.fallback = RandomPolicy::new(self.policy.action_count(), seed);
    }

    pub fn current(&self) -> Option<&OpponentSnapshot<Q::Weights>> {
        self.current.as_ref()
    }

    pub fn promotions(&self) -> usize {
        self.promotions
    }
}

impl<Q: ValueApproximator> OpponentPolicy for SelfPlayRegistry<Q> {
    /// Greedy action of the held snapshot; uniformly random while none is held.
    fn predict(&mut self, observation: &[f64]) -> Result<usize, ApproximatorError> {
        match self.current {
            None => Ok(self.fallback.sample()),
            Some(_) => Ok(argmax(&self.policy.predict(observation)?)),
        }
    }

    fn name(&self) -> &str {
        "SelfPlay"
    }
}

/// Another trained agent playing greedily from its own observations.
pub struct GreedyOpponent<'a, Q: ValueApproximator> {
    agent: &'a DqnAgent<Q>,
}

impl<'a, Q: ValueApproximator> GreedyOpponent<'a, Q> {
    pub fn new(agent: &'a DqnAgent<Q>) -> Self {
        GreedyOpponent { agent }
    }
}

impl<Q: ValueApproximator> OpponentPolicy for GreedyOpponent<'_, Q> {
    fn predict(&mut self, observation: &[f64]) -> Result<usize, ApproximatorError> {
        self.agent.act_greedy(observation)
    }

    fn name(&self) -> &str {
        self.agent.name()
    }
}
