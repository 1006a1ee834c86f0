//! # Self-play DQN
//!
//! Value-based reinforcement learning for a two-player duel: a DQN agent with
//! experience replay and a target network, trained either against a fixed
//! opponent or through a self-play curriculum that promotes the agent's own
//! best snapshot. Networks are built with the Burn ML framework.
//!
//! ## Modules
//!
//! - [`env`]: Environment contract, action codec, bundled volleyball duel
//! - [`ai`]: Value approximators, DQN agent, opponent policies, self-play registry
//! - [`training`]: Replay buffer, episode runner, evaluation, metrics, trainer
//! - [`checkpoint`]: Snapshot persistence and metadata
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod env;
pub mod error;
pub mod training;

#[cfg(test)]
mod test_support;
