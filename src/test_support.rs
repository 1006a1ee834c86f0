//! Deterministic collaborators for unit tests.

use std::path::Path;

use crate::ai::{OpponentPolicy, ValueApproximator};
use crate::env::{ActionFlags, Environment, StepInfo, StepOutcome};
use crate::error::{ApproximatorError, EnvError};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LinearWeights {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

/// Linear action values `Q(s)[a] = w[a] . s + b[a]`, fit by one plain SGD
/// step on the squared error.
#[derive(Debug, Clone)]
pub struct LinearStub {
    params: LinearWeights,
    lr: f64,
    pub fail_fit: bool,
    pub fail_predict: bool,
    pub fits: Vec<(Vec<Vec<f64>>, Vec<Vec<f64>>)>,
}

impl LinearStub {
    pub fn new(dim: usize, actions: usize) -> Self {
        let weights = (0..actions)
            .map(|a| {
                (0..dim)
                    .map(|j| ((a * 7 + j * 3) % 11) as f64 / 10.0 - 0.5)
                    .collect()
            })
            .collect();
        LinearStub {
            params: LinearWeights {
                weights,
                bias: vec![0.0; actions],
            },
            lr: 0.05,
            fail_fit: false,
            fail_predict: false,
            fits: Vec::new(),
        }
    }

    /// Constant action values regardless of state.
    pub fn constant(dim: usize, values: Vec<f64>) -> Self {
        let mut stub = LinearStub::new(dim, values.len());
        stub.params.weights = vec![vec![0.0; dim]; values.len()];
        stub.params.bias = values;
        stub
    }
}

impl ValueApproximator for LinearStub {
    type Weights = LinearWeights;

    fn action_count(&self) -> usize {
        self.params.bias.len()
    }

    fn predict(&self, state: &[f64]) -> Result<Vec<f64>, ApproximatorError> {
        if self.fail_predict {
            return Err(ApproximatorError::Other("predict failure".into()));
        }
        let dim = self.params.weights[0].len();
        if state.len() != dim {
            return Err(ApproximatorError::StateShape {
                expected: dim,
                got: state.len(),
            });
        }
        Ok(self
            .params
            .weights
            .iter()
            .zip(&self.params.bias)
            .map(|(w, b)| w.iter().zip(state).map(|(w, s)| w * s).sum::<f64>() + b)
            .collect())
    }

    fn fit(
        &mut self,
        states: &[Vec<f64>],
        targets: &[Vec<f64>],
        _batch_size: usize,
    ) -> Result<f64, ApproximatorError> {
        if self.fail_fit {
            return Err(ApproximatorError::Diverged(f64::NAN));
        }
        self.fits.push((states.to_vec(), targets.to_vec()));
        let n = states.len() as f64;
        let mut loss = 0.0;
        for (state, target) in states.iter().zip(targets) {
            let pred = self.predict(state)?;
            for (a, (p, t)) in pred.iter().zip(target).enumerate() {
                let err = p - t;
                loss += err * err;
                for (w, s) in self.params.weights[a].iter_mut().zip(state) {
                    *w -= self.lr * err * s / n;
                }
                self.params.bias[a] -= self.lr * err / n;
            }
        }
        Ok(loss / n)
    }

    fn get_weights(&self) -> Self::Weights {
        self.params.clone()
    }

    fn set_weights(&mut self, weights: Self::Weights) {
        self.params = weights;
    }

    fn save(&self, path: &Path) -> Result<(), ApproximatorError> {
        let json = serde_json::to_string(&self.params)
            .map_err(|e| ApproximatorError::Other(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| ApproximatorError::Record {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn load(&mut self, path: &Path) -> Result<(), ApproximatorError> {
        let json = std::fs::read_to_string(path).map_err(|e| ApproximatorError::Record {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.params =
            serde_json::from_str(&json).map_err(|e| ApproximatorError::Other(e.to_string()))?;
        Ok(())
    }
}

/// Idle opponent that keeps every observation it is shown.
#[derive(Debug, Default)]
pub struct RecordingOpponent {
    pub seen: Vec<Vec<f64>>,
}

impl OpponentPolicy for RecordingOpponent {
    fn predict(&mut self, observation: &[f64]) -> Result<usize, ApproximatorError> {
        self.seen.push(observation.to_vec());
        Ok(0)
    }

    fn name(&self) -> &str {
        "Recording"
    }
}

pub const SCRIPTED_DIM: usize = 3;

/// Fixed-length episodes with observations derived from the seed and tick.
///
/// Side A earns +1 for every jump, side B's jumps cost A 0.5. Every step
/// is recorded as `(agent action, explicit opponent action)`.
pub struct ScriptedEnv {
    pub episode_len: usize,
    pub fail_at_tick: Option<usize>,
    pub log: Vec<(usize, Option<usize>)>,
    pub seeds: Vec<u64>,
    seed: u64,
    tick: usize,
}

impl ScriptedEnv {
    pub fn new(episode_len: usize) -> Self {
        ScriptedEnv {
            episode_len,
            fail_at_tick: None,
            log: Vec::new(),
            seeds: Vec::new(),
            seed: 0,
            tick: 0,
        }
    }

    fn observation(&self) -> Vec<f64> {
        vec![
            (self.seed % 10) as f64 * 0.1,
            self.tick as f64 / self.episode_len as f64,
            1.0,
        ]
    }
}

impl Environment for ScriptedEnv {
    fn observation_dim(&self) -> usize {
        SCRIPTED_DIM
    }

    fn reset(&mut self) -> Result<Vec<f64>, EnvError> {
        self.tick = 0;
        Ok(self.observation())
    }

    fn step(
        &mut self,
        action: ActionFlags,
        opponent: Option<ActionFlags>,
    ) -> Result<StepOutcome, EnvError> {
        if self.tick >= self.episode_len {
            return Err(EnvError::EpisodeOver);
        }
        if self.fail_at_tick == Some(self.tick) {
            return Err(EnvError::Other("scripted failure".into()));
        }
        self.log.push((action.index(), opponent.map(ActionFlags::index)));
        self.tick += 1;

        let mut reward = if action.jump { 1.0 } else { 0.0 };
        if opponent.is_some_and(|o| o.jump) {
            reward -= 0.5;
        }
        let observation = self.observation();
        let mirrored = observation.iter().map(|v| -v).collect();
        Ok(StepOutcome {
            observation,
            reward,
            done: self.tick >= self.episode_len,
            info: StepInfo {
                other_observation: Some(mirrored),
            },
        })
    }

    fn seed(&mut self, value: u64) {
        self.seeds.push(value);
        self.seed = value;
    }
}
