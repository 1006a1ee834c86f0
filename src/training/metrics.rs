use std::collections::VecDeque;

use crate::training::episode::EpisodeResult;

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, 0 for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Training metrics tracker with rolling window computations.
pub struct TrainingMetrics {
    returns: VecDeque<f64>,
    update_losses: VecDeque<f64>,
    capacity: usize,
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            returns: VecDeque::with_capacity(capacity),
            update_losses: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record_episode(&mut self, result: &EpisodeResult) {
        push_capped(&mut self.returns, result.episode_return, self.capacity);
        for &loss in &result.losses {
            push_capped(&mut self.update_losses, loss, self.capacity);
        }
    }

    /// Mean return over the last N episodes.
    pub fn average_return(&self, last_n: usize) -> f64 {
        mean(&last(&self.returns, last_n))
    }

    /// Population std of the return over the last N episodes.
    pub fn return_std(&self, last_n: usize) -> f64 {
        std_dev(&last(&self.returns, last_n))
    }

    /// Average loss over the last N updates.
    pub fn average_loss(&self, last_n: usize) -> f64 {
        mean(&last(&self.update_losses, last_n))
    }
}

fn push_capped<T>(queue: &mut VecDeque<T>, value: T, capacity: usize) {
    queue.push_back(value);
    if queue.len() > capacity {
        queue.pop_front();
    }
}

fn last(queue: &VecDeque<f64>, n: usize) -> Vec<f64> {
    queue.iter().rev().take(n).copied().collect()
}
