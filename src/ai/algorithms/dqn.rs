use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ai::agent::{Transition, UpdateMetrics};
use crate::ai::approximator::{argmax, max_value, ValueApproximator};
use crate::error::{ActionError, ApproximatorError, TrainingError};
use crate::training::replay_buffer::ReplayBuffer;

/// DQN hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub epsilon_start: f64,
    pub epsilon_min: f64,
    /// Multiplicative decay applied once per learning update that ran.
    pub epsilon_decay: f64,
    pub discount: f64,
    /// Minimum buffer length before learning starts.
    pub warmup: usize,
    pub replay_capacity: usize,
    pub batch_size: usize,
    pub target_sync_interval: usize,
    pub learn_interval: usize,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.9995,
            discount: 0.95,
            warmup: 10_000,
            replay_capacity: 10_000,
            batch_size: 32,
            target_sync_interval: 1000,
            learn_interval: 10,
        }
    }
}

/// TD target for one transition. Terminal transitions bootstrap to exactly
/// `reward`, whatever the next state's values are.
pub fn td_target(reward: f64, discount: f64, max_future_q: f64, terminal: bool) -> f64 {
    if terminal {
        reward
    } else {
        reward + discount * max_future_q
    }
}

/// DQN agent with online + target approximators, a replay buffer, and an
/// epsilon-greedy behaviour policy.
///
/// The agent never synchronises its target on its own; the episode runner
/// calls [`DqnAgent::sync_target`] on the step-counted cadence.
pub struct DqnAgent<Q: ValueApproximator> {
    name: String,
    state_dim: usize,
    online: Q,
    target: Q,
    replay_buffer: ReplayBuffer,
    config: DqnConfig,
    epsilon: f64,
    step: u64,
    update_count: u64,
    rng: StdRng,
}

impl<Q: ValueApproximator> DqnAgent<Q> {
    pub fn new(
        name: impl Into<String>,
        state_dim: usize,
        config: DqnConfig,
        online: Q,
        mut target: Q,
        seed: u64,
    ) -> Self {
        target.set_weights(online.get_weights());
        let mut rng = StdRng::seed_from_u64(seed);
        let replay_buffer = ReplayBuffer::new(config.replay_capacity, rng.random());

        DqnAgent {
            name: name.into(),
            state_dim,
            online,
            target,
            replay_buffer,
            epsilon: config.epsilon_start,
            config,
            step: 0,
            update_count: 0,
            rng,
        }
    }

    /// Epsilon-greedy action: uniformly random with probability epsilon,
    /// greedy otherwise.
    pub fn act(&mut self, state: &[f64]) -> Result<usize, ApproximatorError> {
        if self.rng.random::<f64>() < self.epsilon {
            return Ok(self.act_random());
        }
        self.act_greedy(state)
    }

    /// Greedy action from the online approximator. Never touches epsilon or
    /// the step counter.
    pub fn act_greedy(&self, state: &[f64]) -> Result<usize, ApproximatorError> {
        Ok(argmax(&self.online.predict(state)?))
    }

    pub fn act_random(&mut self) -> usize {
        self.rng.random_range(0..self.online.action_count())
    }

    pub fn update_replay_memory(&mut self, transition: Transition) {
        self.replay_buffer.append(transition);
    }

    /// One learning update from a replayed batch.
    ///
    /// Returns `Ok(None)` without side effects until the buffer holds
    /// `max(warmup, batch_size)` transitions.
    pub fn learn(&mut self) -> Result<Option<UpdateMetrics>, TrainingError> {
        let threshold = self.config.warmup.max(self.config.batch_size);
        if self.replay_buffer.size() < threshold {
            return Ok(None);
        }

        let batch = self.replay_buffer.sample(self.config.batch_size)?;
        let states: Vec<Vec<f64>> = batch.iter().map(|t| t.state.clone()).collect();
        let next_states: Vec<Vec<f64>> = batch.iter().map(|t| t.next_state.clone()).collect();

        let next_q = self.target.predict_batch(&next_states)?;
        // Untouched coordinates keep the current prediction, so only the
        // taken action's value moves under the full-vector loss.
        let mut targets = self.online.predict_batch(&states)?;
        for ((transition, next), row) in batch.iter().zip(&next_q).zip(targets.iter_mut()) {
            let count = row.len();
            let slot = row
                .get_mut(transition.action)
                .ok_or(ActionError::IndexOutOfRange {
                    index: transition.action,
                    count,
                })?;
            *slot = td_target(
                transition.reward,
                self.config.discount,
                max_value(next),
                transition.terminal,
            );
        }

        let loss = self.online.fit(&states, &targets, self.config.batch_size)?;
        self.decay_epsilon();
        self.update_count += 1;

        Ok(Some(UpdateMetrics {
            loss,
            epsilon: self.epsilon,
        }))
    }

    /// Replace the target approximator's parameters with the online ones.
    pub fn sync_target(&mut self) {
        self.target.set_weights(self.online.get_weights());
    }

    /// Advance the interaction counter, returning the new value.
    pub fn increment_step(&mut self) -> u64 {
        self.step += 1;
        self.step
    }

    fn decay_epsilon(&mut self) {
        if self.epsilon > self.config.epsilon_min {
            self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn action_count(&self) -> usize {
        self.online.action_count()
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn replay_len(&self) -> usize {
        self.replay_buffer.size()
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn online(&self) -> &Q {
        &self.online
    }

    pub fn target(&self) -> &Q {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::LinearStub;

    const DIM: usize = 3;

    fn agent_with(config: DqnConfig, online: LinearStub) -> DqnAgent<LinearStub> {
        let target = LinearStub::new(DIM, online.action_count());
        DqnAgent::new("test", DIM, config, online, target, 42)
    }

    fn small_config() -> DqnConfig {
        DqnConfig {
            warmup: 4,
            batch_size: 4,
            replay_capacity: 16,
            ..Default::default()
        }
    }

    fn transition(i: usize, terminal: bool) -> Transition {
        Transition {
            state: vec![i as f64 * 0.1, 0.5, 1.0],
            action: i % 8,
            reward: 1.0,
            next_state: vec![i as f64 * 0.1 + 0.1, 0.5, 1.0],
            terminal,
        }
    }

    #[test]
    fn test_td_target_terminal_is_reward() {
        assert_eq!(td_target(1.0, 0.95, 123.0, true), 1.0);
        assert_eq!(td_target(1.0, 0.95, f64::NAN, true), 1.0);
    }

    #[test]
    fn test_td_target_bootstraps() {
        assert_eq!(td_target(0.0, 0.95, 2.0, false), 1.9);
    }

    #[test]
    fn test_target_starts_synced() {
        let agent = agent_with(small_config(), LinearStub::new(DIM, 8));
        let probe = [0.2, -0.4, 0.9];
        assert_eq!(
            agent.target().predict(&probe).unwrap(),
            agent.online().predict(&probe).unwrap()
        );
    }

    #[test]
    fn test_act_greedy_ties_break_low() {
        let online = LinearStub::constant(DIM, vec![0.0, 3.0, 1.0, 3.0, 0.0, 0.0, 0.0, 0.0]);
        let agent = agent_with(small_config(), online);
        assert_eq!(agent.act_greedy(&[0.0; DIM]).unwrap(), 1);
    }

    #[test]
    fn test_act_with_zero_epsilon_is_greedy() {
        let online = LinearStub::constant(DIM, vec![0.0, 0.0, 0.0, 0.0, 0.0, 9.0, 0.0, 0.0]);
        let mut agent = agent_with(
            DqnConfig {
                epsilon_start: 0.0,
                ..small_config()
            },
            online,
        );
        for _ in 0..50 {
            assert_eq!(agent.act(&[0.0; DIM]).unwrap(), 5);
        }
    }

    #[test]
    fn test_act_with_full_epsilon_explores() {
        let online = LinearStub::constant(DIM, vec![9.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let mut agent = agent_with(small_config(), online);
        let actions: Vec<usize> = (0..200).map(|_| agent.act(&[0.0; DIM]).unwrap()).collect();
        assert!(actions.iter().all(|&a| a < 8));
        assert!(actions.iter().any(|&a| a != 0));
        assert_eq!(agent.step(), 0, "act must not advance the step counter");
    }

    #[test]
    fn test_learn_is_noop_before_warmup() {
        let mut agent = agent_with(small_config(), LinearStub::new(DIM, 8));
        for i in 0..3 {
            agent.update_replay_memory(transition(i, false));
        }
        assert_eq!(agent.learn().unwrap(), None);
        assert_eq!(agent.epsilon(), 1.0);
        assert!(agent.online().fits.is_empty());
    }

    #[test]
    fn test_learn_waits_for_batch_when_warmup_is_smaller() {
        let mut agent = agent_with(
            DqnConfig {
                warmup: 2,
                batch_size: 10,
                ..small_config()
            },
            LinearStub::new(DIM, 8),
        );
        for i in 0..5 {
            agent.update_replay_memory(transition(i, false));
        }
        assert_eq!(agent.learn().unwrap(), None);
    }

    #[test]
    fn test_one_learn_decays_epsilon_once() {
        let mut agent = agent_with(small_config(), LinearStub::new(DIM, 8));
        for i in 0..4 {
            agent.update_replay_memory(transition(i, false));
        }
        let metrics = agent.learn().unwrap().expect("update should run");
        assert_eq!(agent.epsilon(), 0.9995);
        assert_eq!(metrics.epsilon, 0.9995);
        assert_eq!(agent.update_count(), 1);
    }

    #[test]
    fn test_epsilon_is_monotone_and_floored() {
        let mut agent = agent_with(
            DqnConfig {
                epsilon_decay: 0.5,
                ..small_config()
            },
            LinearStub::new(DIM, 8),
        );
        for i in 0..4 {
            agent.update_replay_memory(transition(i, false));
        }
        let mut previous = agent.epsilon();
        for _ in 0..20 {
            agent.learn().unwrap();
            assert!(agent.epsilon() <= previous);
            assert!(agent.epsilon() >= 0.01);
            previous = agent.epsilon();
        }
        assert_eq!(agent.epsilon(), 0.01);
    }

    #[test]
    fn test_learn_overwrites_only_taken_action() {
        // Online predicts 0.5 everywhere; target predicts 2.0 everywhere.
        let online = LinearStub::constant(DIM, vec![0.5; 8]);
        let target = LinearStub::constant(DIM, vec![2.0; 8]);
        let mut agent = DqnAgent::new(
            "test",
            DIM,
            DqnConfig {
                warmup: 2,
                batch_size: 2,
                ..small_config()
            },
            online,
            LinearStub::constant(DIM, vec![0.0; 8]),
            1,
        );
        // Diverge the target from online so the bootstrap is observable.
        agent.target.set_weights(target.get_weights());

        agent.update_replay_memory(Transition {
            state: vec![0.0; DIM],
            action: 3,
            reward: 0.0,
            next_state: vec![1.0; DIM],
            terminal: false,
        });
        agent.update_replay_memory(Transition {
            state: vec![1.0; DIM],
            action: 6,
            reward: 1.0,
            next_state: vec![f64::NAN; DIM],
            terminal: true,
        });
        agent.learn().unwrap().expect("update should run");

        let (states, targets) = &agent.online().fits[0];
        for (state, row) in states.iter().zip(targets) {
            let (action, expected) = if state[0] == 0.0 { (3, 1.9) } else { (6, 1.0) };
            for (a, &v) in row.iter().enumerate() {
                if a == action {
                    assert_eq!(v, expected);
                } else {
                    assert_eq!(v, 0.5);
                }
            }
        }
    }

    #[test]
    fn test_sync_target_copies_online_exactly() {
        let mut agent = agent_with(small_config(), LinearStub::new(DIM, 8));
        for i in 0..4 {
            agent.update_replay_memory(transition(i, false));
        }
        agent.learn().unwrap();
        let probe = [0.3, 0.1, -0.7];
        assert_ne!(
            agent.target().predict(&probe).unwrap(),
            agent.online().predict(&probe).unwrap()
        );

        agent.sync_target();
        for probe in [[0.3, 0.1, -0.7], [1.0, 1.0, 1.0], [0.0, -2.0, 0.5]] {
            assert_eq!(
                agent.target().predict(&probe).unwrap(),
                agent.online().predict(&probe).unwrap()
            );
        }
    }

    #[test]
    fn test_fit_failure_propagates_without_decay() {
        let mut online = LinearStub::new(DIM, 8);
        online.fail_fit = true;
        let mut agent = agent_with(small_config(), online);
        for i in 0..4 {
            agent.update_replay_memory(transition(i, false));
        }
        let err = agent.learn().unwrap_err();
        assert!(matches!(
            err,
            TrainingError::Approximator(ApproximatorError::Diverged(_))
        ));
        assert_eq!(agent.epsilon(), 1.0);
    }

    #[test]
    fn test_invalid_stored_action_is_rejected() {
        let mut agent = agent_with(small_config(), LinearStub::new(DIM, 8));
        for i in 0..4 {
            let mut t = transition(i, false);
            t.action = 8;
            agent.update_replay_memory(t);
        }
        assert!(matches!(
            agent.learn().unwrap_err(),
            TrainingError::Action(ActionError::IndexOutOfRange { index: 8, count: 8 })
        ));
    }

    #[test]
    fn test_increment_step_is_monotonic() {
        let mut agent = agent_with(small_config(), LinearStub::new(DIM, 8));
        assert_eq!(agent.increment_step(), 1);
        assert_eq!(agent.increment_step(), 2);
        assert_eq!(agent.step(), 2);
    }
}
