use crate::ai::{DqnAgent, ValueApproximator};
use crate::env::{decode, Environment};
use crate::error::TrainingError;
use crate::training::episode::{check_observation, Opponent};
use crate::training::metrics::{mean, std_dev};

/// Aggregate of one evaluation: per-trial rewards plus mean and population
/// standard deviation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EvalSummary {
    pub opponent: String,
    pub rewards: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl EvalSummary {
    pub fn new(opponent: impl Into<String>, rewards: Vec<f64>) -> Self {
        EvalSummary {
            opponent: opponent.into(),
            mean: mean(&rewards),
            std: std_dev(&rewards),
            rewards,
        }
    }
}

/// Play one greedy episode for the agent and return its total reward.
///
/// Side B always receives its own mirrored observation from the previous
/// step's info, starting from the reset observation.
pub fn rollout<E, Q>(
    env: &mut E,
    agent: &DqnAgent<Q>,
    opponent: &mut Opponent<'_>,
) -> Result<f64, TrainingError>
where
    E: Environment,
    Q: ValueApproximator,
{
    let mut state = env.reset()?;
    check_observation(&state, agent.state_dim())?;
    let mut opponent_state = state.clone();
    let mut total_reward = 0.0;

    loop {
        let action = decode(agent.act_greedy(&state)?)?;
        let opponent_action = opponent.action(&opponent_state)?;
        let outcome = env.step(action, opponent_action)?;
        check_observation(&outcome.observation, agent.state_dim())?;
        total_reward += outcome.reward;
        if outcome.done {
            return Ok(total_reward);
        }
        opponent_state = outcome
            .info
            .other_observation
            .unwrap_or_else(|| outcome.observation.clone());
        state = outcome.observation;
    }
}

/// Repeat greedy rollouts, reseeding the environment with `init_seed + i`
/// before trial `i`. Returns the per-trial rewards.
pub fn evaluate<E, Q>(
    env: &mut E,
    agent: &DqnAgent<Q>,
    mut opponent: Opponent<'_>,
    n_trials: usize,
    init_seed: u64,
) -> Result<Vec<f64>, TrainingError>
where
    E: Environment,
    Q: ValueApproximator,
{
    let mut history = Vec::with_capacity(n_trials);
    for i in 0..n_trials {
        env.seed(init_seed + i as u64);
        history.push(rollout(env, agent, &mut opponent)?);
    }
    Ok(history)
}
