use crate::error::ApproximatorError;

/// A single step of experience for RL training. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: Vec<f64>,
    pub action: usize,
    pub reward: f64,
    pub next_state: Vec<f64>,
    pub terminal: bool,
}

/// Metrics returned from a learning update that actually ran.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UpdateMetrics {
    pub loss: f64,
    /// Epsilon after this update's decay.
    pub epsilon: f64,
}

/// Strategy interface for whoever controls side B: one discrete action per
/// observation, seen in side B's own frame.
pub trait OpponentPolicy {
    fn predict(&mut self, observation: &[f64]) -> Result<usize, ApproximatorError>;

    /// Display name for logs.
    fn name(&self) -> &str;
}
