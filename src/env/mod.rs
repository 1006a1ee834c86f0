//! Two-player environment contract, the discrete action codec, and a small
//! bundled volleyball duel implementing the contract.

mod action;
mod volley;

pub use action::{decode, encode, ActionFlags, ACTION_COUNT};
pub use volley::{baseline_action, VolleyConfig, VolleyEnv, OBSERVATION_DIM};

use crate::error::EnvError;

/// Auxiliary per-step output of an environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepInfo {
    /// Side B's observation in its own mirrored frame, when the environment
    /// exposes it.
    pub other_observation: Option<Vec<f64>>,
}

/// Result of advancing the environment by one interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observation: Vec<f64>,
    /// Reward from side A's perspective.
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

/// A two-player competitive game seen from side A.
///
/// Side B is either driven explicitly (`Some(action)`) or, when `None` is
/// passed, by the environment's built-in scripted baseline. The environment
/// never holds a policy of its own beyond that baseline.
pub trait Environment {
    /// Dimensionality of observations returned by `reset` and `step`.
    fn observation_dim(&self) -> usize;

    /// Start a new episode and return side A's first observation.
    fn reset(&mut self) -> Result<Vec<f64>, EnvError>;

    fn step(
        &mut self,
        action: ActionFlags,
        opponent: Option<ActionFlags>,
    ) -> Result<StepOutcome, EnvError>;

    /// Deterministically reseed the randomness of subsequent episodes.
    fn seed(&mut self, value: u64);
}
