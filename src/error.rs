use std::path::PathBuf;

/// The codec was handed something outside its domain (`InvalidAction`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("invalid action index {index} (expected 0..{count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("invalid action vector {0:?} (expected 3 entries of 0 or 1)")]
    MalformedVector(Vec<u8>),
}

/// Errors raised by the experience replay buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("insufficient data: requested {requested} transitions, buffer holds {available}")]
    InsufficientData { requested: usize, available: usize },
}

/// Failures of a value approximator. None of these are recovered.
#[derive(Debug, thiserror::Error)]
pub enum ApproximatorError {
    #[error("state has dimension {got}, approximator expects {expected}")]
    StateShape { expected: usize, got: usize },

    #[error("target vector has length {got}, approximator outputs {expected}")]
    TargetShape { expected: usize, got: usize },

    #[error("fit called with {states} states but {targets} targets")]
    BatchMismatch { states: usize, targets: usize },

    #[error("loss diverged to {0}")]
    Diverged(f64),

    #[error("tensor data extraction failed: {0}")]
    Tensor(String),

    #[error("failed to record model at {path}: {message}")]
    Record { path: PathBuf, message: String },

    #[error("approximator failure: {0}")]
    Other(String),
}

/// Failures of an environment collaborator. None of these are recovered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvError {
    #[error("step called on a finished episode; call reset first")]
    EpisodeOver,

    #[error("observation has dimension {got}, expected {expected}")]
    ObservationShape { expected: usize, got: usize },

    #[error("environment failure: {0}")]
    Other(String),
}

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("snapshot directory not found: {0}")]
    DirNotFound(PathBuf),

    #[error("failed to read metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata from {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to save model: {0}")]
    ModelSave(#[source] ApproximatorError),

    #[error("failed to load model: {0}")]
    ModelLoad(#[source] ApproximatorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that terminate a training run.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("action error: {0}")]
    Action(#[from] ActionError),

    #[error("replay error: {0}")]
    Replay(#[from] ReplayError),

    #[error("approximator error: {0}")]
    Approximator(#[from] ApproximatorError),

    #[error("environment error: {0}")]
    Env(#[from] EnvError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_display() {
        let err = ActionError::IndexOutOfRange { index: 9, count: 8 };
        assert_eq!(err.to_string(), "invalid action index 9 (expected 0..8)");
    }

    #[test]
    fn test_replay_error_display() {
        let err = ReplayError::InsufficientData {
            requested: 32,
            available: 4,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: requested 32 transitions, buffer holds 4"
        );
    }

    #[test]
    fn test_training_error_wraps_approximator_failure() {
        let err: TrainingError = ApproximatorError::Diverged(f64::NAN).into();
        assert!(matches!(
            err,
            TrainingError::Approximator(ApproximatorError::Diverged(_))
        ));
        assert!(err.to_string().starts_with("approximator error: loss diverged"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("dqn.learning_rate must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: dqn.learning_rate must be > 0"
        );
    }
}
