//! Training infrastructure: replay buffer, episode runner, seeded
//! evaluation, metrics collection, and the multi-run trainer.

pub mod episode;
pub mod evaluation;
pub mod metrics;
pub mod replay_buffer;
pub mod trainer;
