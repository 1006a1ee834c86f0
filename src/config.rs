use std::path::Path;

use tracing::warn;

use crate::ai::{DqnConfig, NetworkConfig};
use crate::checkpoint::CheckpointManagerConfig;
use crate::env::VolleyConfig;
use crate::error::ConfigError;
use crate::training::episode::OpponentMode;
use crate::training::trainer::TrainerConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dqn: DqnConfig,
    pub network: NetworkConfig,
    pub training: TrainerConfig,
    pub checkpoint: CheckpointManagerConfig,
    pub env: VolleyConfig,
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Validation(message.into()))
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dqn = &self.dqn;
        if !(self.network.learning_rate > 0.0) {
            return invalid("network.learning_rate must be > 0");
        }
        if self.network.hidden_dim == 0 {
            return invalid("network.hidden_dim must be > 0");
        }
        if !(0.0..=1.0).contains(&dqn.discount) {
            return invalid("dqn.discount must be in [0, 1]");
        }
        if !(dqn.epsilon_decay > 0.0 && dqn.epsilon_decay < 1.0) {
            return invalid("dqn.epsilon_decay must be in (0, 1)");
        }

        // Epsilon schedule
        if !(0.0..=1.0).contains(&dqn.epsilon_start) {
            return invalid("dqn.epsilon_start must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&dqn.epsilon_min) {
            return invalid("dqn.epsilon_min must be in [0, 1]");
        }
        if dqn.epsilon_min > dqn.epsilon_start {
            return invalid("dqn.epsilon_min must be <= dqn.epsilon_start");
        }

        if dqn.batch_size == 0 {
            return invalid("dqn.batch_size must be > 0");
        }
        if dqn.replay_capacity < dqn.batch_size {
            return invalid("dqn.replay_capacity must be >= dqn.batch_size");
        }
        if dqn.warmup < dqn.batch_size {
            return invalid("dqn.warmup must be >= dqn.batch_size");
        }
        if dqn.learn_interval == 0 {
            return invalid("dqn.learn_interval must be > 0");
        }
        if dqn.target_sync_interval == 0 {
            return invalid("dqn.target_sync_interval must be > 0");
        }

        let training = &self.training;
        if training.runs == 0 {
            return invalid("training.runs must be > 0");
        }
        if training.eval_freq == 0 {
            return invalid("training.eval_freq must be > 0");
        }
        if training.eval_episodes == 0 {
            return invalid("training.eval_episodes must be > 0");
        }
        if training.log_interval == 0 {
            return invalid("training.log_interval must be > 0");
        }
        if training.training_opponent == OpponentMode::SelfPlay {
            return invalid("training.training_opponent must be expert or random; set training.selfplay instead");
        }

        if self.env.max_ticks == 0 {
            return invalid("env.max_ticks must be > 0");
        }
        if self.env.lives == 0 {
            return invalid("env.lives must be > 0");
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> Result<String, ConfigError> {
        toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| ConfigError::Validation(format!("default config serialization: {}", e)))
    }
}
