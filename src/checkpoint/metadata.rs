use serde::{Deserialize, Serialize};

/// Why a snapshot was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    /// Promoted to self-play opponent.
    History,
    /// End of a training run.
    Final,
}

impl SnapshotKind {
    pub fn tag(self) -> &'static str {
        match self {
            SnapshotKind::History => "history",
            SnapshotKind::Final => "final",
        }
    }
}

/// Snapshot metadata written to metadata.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub agent_name: String,
    pub kind: SnapshotKind,
    pub step: u64,
    pub epsilon: f64,
    pub update_count: u64,
    /// Mean evaluation reward that earned a promotion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_reward: Option<f64>,
    pub timestamp: u64,
}
