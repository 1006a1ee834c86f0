use tracing::debug;

use crate::ai::{DqnAgent, OpponentPolicy, Transition, ValueApproximator};
use crate::env::{decode, ActionFlags, Environment, StepOutcome};
use crate::error::{EnvError, TrainingError};

/// Who controls side B during training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpponentMode {
    /// The environment's built-in scripted baseline.
    Expert,
    /// Uniformly random actions.
    Random,
    /// The self-play registry's best snapshot.
    SelfPlay,
}

/// Side B's controller, resolved once before an episode starts.
pub enum Opponent<'a> {
    /// No explicit action; the environment's baseline plays.
    Expert,
    Policy(&'a mut dyn OpponentPolicy),
}

impl Opponent<'_> {
    /// Side B's action for its own observation.
    pub fn action(&mut self, observation: &[f64]) -> Result<Option<ActionFlags>, TrainingError> {
        match self {
            Opponent::Expert => Ok(None),
            Opponent::Policy(policy) => Ok(Some(decode(policy.predict(observation)?)?)),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Opponent::Expert => "Expert",
            Opponent::Policy(policy) => policy.name(),
        }
    }
}

/// Result of playing a single training episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeResult {
    pub episode_return: f64,
    pub episode_length: u64,
    /// Losses of the learning updates that ran during the episode.
    pub losses: Vec<f64>,
}

/// True on every `interval`-th step; an interval of 0 never fires.
pub(crate) fn every(step: u64, interval: usize) -> bool {
    interval > 0 && step % interval as u64 == 0
}

/// Reject an observation whose length is not the agent's state dimension.
pub(crate) fn check_observation(observation: &[f64], expected: usize) -> Result<(), EnvError> {
    if observation.len() != expected {
        return Err(EnvError::ObservationShape {
            expected,
            got: observation.len(),
        });
    }
    Ok(())
}

/// Play one episode to termination, learning along the way.
///
/// Each interaction advances the agent's step counter once, stores the
/// transition, runs `learn` every `learn_interval` steps and `sync_target`
/// every `target_sync_interval` steps.
pub fn run_episode<E, Q>(
    env: &mut E,
    agent: &mut DqnAgent<Q>,
    mut opponent: Opponent<'_>,
) -> Result<EpisodeResult, TrainingError>
where
    E: Environment,
    Q: ValueApproximator,
{
    let learn_interval = agent.config().learn_interval;
    let sync_interval = agent.config().target_sync_interval;
    let state_dim = agent.state_dim();

    let mut state = env.reset()?;
    check_observation(&state, state_dim)?;
    // Side B starts from the same (symmetric) position.
    let mut opponent_state = state.clone();
    let step_before = agent.step();
    let mut score = 0.0;
    let mut losses = Vec::new();

    loop {
        let step = agent.increment_step();
        let action = agent.act(&state)?;
        let opponent_action = opponent.action(&opponent_state)?;

        let StepOutcome {
            observation,
            reward,
            done,
            info,
        } = env.step(decode(action)?, opponent_action)?;
        check_observation(&observation, state_dim)?;
        score += reward;

        agent.update_replay_memory(Transition {
            state,
            action,
            reward,
            next_state: observation.clone(),
            terminal: done,
        });

        if every(step, learn_interval) {
            if let Some(metrics) = agent.learn()? {
                losses.push(metrics.loss);
            }
        }

        opponent_state = info
            .other_observation
            .unwrap_or_else(|| observation.clone());
        state = observation;

        if every(step, sync_interval) {
            debug!(step, epsilon = agent.epsilon(), "target network update");
            agent.sync_target();
        }

        if done {
            break;
        }
    }

    Ok(EpisodeResult {
        episode_return: score,
        episode_length: agent.step() - step_before,
        losses,
    })
}
