use std::path::Path;

use crate::error::ApproximatorError;

/// Black-box action-value function.
///
/// Predicts one value per action for a state, can be fit toward target
/// vectors, and supports exact weight capture/restore.
pub trait ValueApproximator {
    /// An exact capture of the approximator's parameters.
    type Weights: Clone;

    /// Number of actions (length of every prediction).
    fn action_count(&self) -> usize;

    fn predict(&self, state: &[f64]) -> Result<Vec<f64>, ApproximatorError>;

    fn predict_batch(&self, states: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ApproximatorError> {
        states.iter().map(|s| self.predict(s)).collect()
    }

    /// One gradient-based optimisation step toward `targets`. Returns the loss.
    fn fit(
        &mut self,
        states: &[Vec<f64>],
        targets: &[Vec<f64>],
        batch_size: usize,
    ) -> Result<f64, ApproximatorError>;

    fn get_weights(&self) -> Self::Weights;

    fn set_weights(&mut self, weights: Self::Weights);

    fn save(&self, path: &Path) -> Result<(), ApproximatorError>;

    fn load(&mut self, path: &Path) -> Result<(), ApproximatorError>;
}

/// Index of the largest value, ties broken by the lowest index.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Largest value, `NEG_INFINITY` for an empty slice.
pub fn max_value(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
