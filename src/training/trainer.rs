use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::ai::{
    DqnAgent, DqnConfig, OpponentPolicy, OpponentSnapshot, RandomPolicy, SelfPlayRegistry,
    ValueApproximator,
};
use crate::checkpoint::{CheckpointManager, SnapshotKind};
use crate::env::{Environment, ACTION_COUNT};
use crate::error::TrainingError;
use crate::training::episode::{every, run_episode, Opponent, OpponentMode};
use crate::training::evaluation::{evaluate, EvalSummary};
use crate::training::metrics::TrainingMetrics;

/// Episodes covered by the rolling statistics in progress logs.
pub const PROGRESS_WINDOW: usize = 30;

/// Trainer configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Independent runs, run `i` seeded with `seed + i`.
    pub runs: usize,
    /// Step budget, checked between episodes.
    pub max_steps: u64,
    /// Episodes between evaluations (and self-play examinations).
    pub eval_freq: usize,
    pub eval_episodes: usize,
    /// Mean self-play reward a candidate must strictly exceed to be promoted.
    pub best_threshold: f64,
    pub seed: u64,
    pub eval_seed: u64,
    pub log_interval: usize,
    pub selfplay: bool,
    /// Side B outside self-play mode.
    pub training_opponent: OpponentMode,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            runs: 5,
            max_steps: 50_000,
            eval_freq: 20,
            eval_episodes: 5,
            best_threshold: 0.5,
            seed: 721,
            eval_seed: 123,
            log_interval: 20,
            selfplay: false,
            training_opponent: OpponentMode::Expert,
        }
    }
}

impl TrainerConfig {
    pub fn opponent_mode(&self) -> OpponentMode {
        if self.selfplay {
            OpponentMode::SelfPlay
        } else {
            self.training_opponent
        }
    }
}

/// One evaluation taken during training.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EvalRecord {
    pub episode: usize,
    pub step: u64,
    pub summary: EvalSummary,
}

/// A finished run: the trained agent and what happened along the way.
pub struct TrainedRun<Q: ValueApproximator> {
    pub agent: DqnAgent<Q>,
    pub returns: Vec<f64>,
    pub lengths: Vec<u64>,
    pub evaluations: Vec<EvalRecord>,
    pub promotions: usize,
    /// History snapshots, in promotion order.
    pub snapshots: Vec<PathBuf>,
    pub final_snapshot: PathBuf,
}

/// Promote the candidate built by `snapshot` only if `mean_reward` strictly
/// exceeds `threshold`. A rejected candidate is never built, and the
/// registry is left untouched.
pub fn gated_promote<Q, F>(
    registry: &mut SelfPlayRegistry<Q>,
    threshold: f64,
    mean_reward: f64,
    snapshot: F,
) -> Result<bool, TrainingError>
where
    Q: ValueApproximator,
    F: FnOnce() -> Result<OpponentSnapshot<Q::Weights>, TrainingError>,
{
    if mean_reward > threshold {
        registry.promote(snapshot()?);
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Runs independent DQN training sessions on one environment.
pub struct Trainer {
    config: TrainerConfig,
    dqn: DqnConfig,
    checkpoints: CheckpointManager,
}

impl Trainer {
    pub fn new(config: TrainerConfig, dqn: DqnConfig, checkpoints: CheckpointManager) -> Self {
        Trainer {
            config,
            dqn,
            checkpoints,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Run every configured session. `make_approximator(state_dim,
    /// action_count)` builds each fresh approximator a run needs.
    pub fn train<E, Q, F>(
        &self,
        env: &mut E,
        mut make_approximator: F,
    ) -> Result<Vec<TrainedRun<Q>>, TrainingError>
    where
        E: Environment,
        Q: ValueApproximator,
        F: FnMut(usize, usize) -> Q,
    {
        info!(
            runs = self.config.runs,
            max_steps = self.config.max_steps,
            mode = ?self.config.opponent_mode(),
            "starting DQN training"
        );
        let mut trained = Vec::with_capacity(self.config.runs);
        for run in 0..self.config.runs {
            trained.push(self.train_run(run, env, &mut make_approximator)?);
        }
        Ok(trained)
    }

    fn train_run<E, Q, F>(
        &self,
        run: usize,
        env: &mut E,
        make_approximator: &mut F,
    ) -> Result<TrainedRun<Q>, TrainingError>
    where
        E: Environment,
        Q: ValueApproximator,
        F: FnMut(usize, usize) -> Q,
    {
        let config = &self.config;
        let mode = config.opponent_mode();
        let run_seed = config.seed + run as u64;
        env.seed(run_seed);

        let state_dim = env.observation_dim();
        let mut agent = DqnAgent::new(
            format!("dqn_selfplay{}", run),
            state_dim,
            self.dqn.clone(),
            make_approximator(state_dim, ACTION_COUNT),
            make_approximator(state_dim, ACTION_COUNT),
            run_seed,
        );
        let mut registry =
            SelfPlayRegistry::new(make_approximator(state_dim, ACTION_COUNT), run_seed + 1);
        let mut random_opponent = RandomPolicy::new(ACTION_COUNT, run_seed + 2);

        let start = Instant::now();
        let mut metrics = TrainingMetrics::with_capacity(PROGRESS_WINDOW);
        let mut returns = Vec::new();
        let mut lengths = Vec::new();
        let mut evaluations = Vec::new();
        let mut snapshots = Vec::new();
        let mut episode = 0usize;

        while agent.step() <= config.max_steps {
            episode += 1;
            let opponent = match mode {
                OpponentMode::Expert => Opponent::Expert,
                OpponentMode::Random => Opponent::Policy(&mut random_opponent),
                OpponentMode::SelfPlay => Opponent::Policy(&mut registry),
            };
            let result = run_episode(env, &mut agent, opponent)?;
            metrics.record_episode(&result);
            returns.push(result.episode_return);
            lengths.push(result.episode_length);

            if every(episode as u64, config.log_interval) {
                info!(
                    agent = agent.name(),
                    episode,
                    step = agent.step(),
                    progress = agent.step() as f64 / config.max_steps as f64,
                    epsilon = agent.epsilon(),
                    avg_return = metrics.average_return(PROGRESS_WINDOW),
                    std = metrics.return_std(PROGRESS_WINDOW),
                    avg_loss = metrics.average_loss(PROGRESS_WINDOW),
                    "training progress"
                );
            }

            if !every(episode as u64, config.eval_freq) {
                continue;
            }

            let mut eval_opponent = RandomPolicy::new(ACTION_COUNT, config.eval_seed);
            let rewards = evaluate(
                env,
                &agent,
                Opponent::Policy(&mut eval_opponent),
                config.eval_episodes,
                config.eval_seed,
            )?;
            let summary = EvalSummary::new(eval_opponent.name(), rewards);
            info!(
                agent = agent.name(),
                episode,
                mean = summary.mean,
                std = summary.std,
                trials = config.eval_episodes,
                rewards = ?summary.rewards,
                "interim evaluation"
            );
            evaluations.push(EvalRecord {
                episode,
                step: agent.step(),
                summary,
            });

            if mode != OpponentMode::SelfPlay {
                continue;
            }

            registry.reseed_fallback(config.eval_seed);
            let rewards = evaluate(
                env,
                &agent,
                Opponent::Policy(&mut registry),
                config.eval_episodes,
                config.eval_seed,
            )?;
            let summary = EvalSummary::new(registry.name(), rewards);
            let mean_reward = summary.mean;
            info!(
                agent = agent.name(),
                step = agent.step(),
                mean_reward,
                "self-play examination"
            );
            evaluations.push(EvalRecord {
                episode,
                step: agent.step(),
                summary,
            });

            let promoted = gated_promote(&mut registry, config.best_threshold, mean_reward, || {
                let path =
                    self.checkpoints
                        .save_snapshot(&agent, SnapshotKind::History, Some(mean_reward))?;
                info!(path = %path.display(), "new best model promoted");
                snapshots.push(path.clone());
                Ok(OpponentSnapshot::new(agent.online().get_weights(), agent.step()).with_path(path))
            })?;
            if !promoted {
                info!(mean_reward, threshold = config.best_threshold, "candidate not promoted");
            }
        }

        info!(
            agent = agent.name(),
            episodes = episode,
            elapsed_secs = start.elapsed().as_secs_f64(),
            "training completed"
        );
        let final_snapshot = self
            .checkpoints
            .save_snapshot(&agent, SnapshotKind::Final, None)?;
        info!(path = %final_snapshot.display(), "final model saved");

        Ok(TrainedRun {
            agent,
            returns,
            lengths,
            evaluations,
            promotions: registry.promotions(),
            snapshots,
            final_snapshot,
        })
    }
}
