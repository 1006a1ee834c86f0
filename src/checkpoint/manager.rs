use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ai::{DqnAgent, ValueApproximator};
use crate::checkpoint::metadata::{SnapshotKind, SnapshotMetadata};
use crate::error::CheckpointError;

const MODEL_FILE: &str = "q_network";
const METADATA_FILE: &str = "metadata.json";

/// Configuration for the checkpoint manager.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CheckpointManagerConfig {
    pub checkpoint_dir: PathBuf,
}

impl Default for CheckpointManagerConfig {
    fn default() -> Self {
        CheckpointManagerConfig {
            checkpoint_dir: PathBuf::from("dqn_test"),
        }
    }
}

/// Writes, reads, and lists agent snapshots.
///
/// Each snapshot is a directory named `{agent}_{kind}_step{step}` holding
/// the online approximator and its metadata.
pub struct CheckpointManager {
    config: CheckpointManagerConfig,
}

impl CheckpointManager {
    pub fn new(config: CheckpointManagerConfig) -> Result<Self, CheckpointError> {
        fs::create_dir_all(&config.checkpoint_dir)?;
        Ok(CheckpointManager { config })
    }

    pub fn snapshot_name(agent_name: &str, kind: SnapshotKind, step: u64) -> String {
        format!("{}_{}_step{}", agent_name, kind.tag(), step)
    }

    /// Persist the agent's online approximator.
    pub fn save_snapshot<Q: ValueApproximator>(
        &self,
        agent: &DqnAgent<Q>,
        kind: SnapshotKind,
        mean_reward: Option<f64>,
    ) -> Result<PathBuf, CheckpointError> {
        let dir_name = Self::snapshot_name(agent.name(), kind, agent.step());
        let tmp_dir = self.config.checkpoint_dir.join(format!("{}.tmp", dir_name));
        let final_dir = self.config.checkpoint_dir.join(&dir_name);

        fs::create_dir_all(&tmp_dir)?;
        agent
            .online()
            .save(&tmp_dir.join(MODEL_FILE))
            .map_err(CheckpointError::ModelSave)?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let metadata = SnapshotMetadata {
            agent_name: agent.name().to_string(),
            kind,
            step: agent.step(),
            epsilon: agent.epsilon(),
            update_count: agent.update_count(),
            mean_reward,
            timestamp,
        };
        fs::write(
            tmp_dir.join(METADATA_FILE),
            serde_json::to_string_pretty(&metadata)?,
        )?;

        // Atomic rename
        if final_dir.exists() {
            fs::remove_dir_all(&final_dir)?;
        }
        fs::rename(&tmp_dir, &final_dir)?;
        Ok(final_dir)
    }

    pub fn load_metadata(&self, dir: &Path) -> Result<SnapshotMetadata, CheckpointError> {
        if !dir.is_dir() {
            return Err(CheckpointError::DirNotFound(dir.to_path_buf()));
        }
        let meta_path = dir.join(METADATA_FILE);
        let json = fs::read_to_string(&meta_path).map_err(|e| CheckpointError::MetadataRead {
            path: meta_path.clone(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| CheckpointError::MetadataParse {
            path: meta_path,
            source: e,
        })
    }

    /// Load a snapshot's weights into `approximator`.
    pub fn restore<Q: ValueApproximator>(
        &self,
        approximator: &mut Q,
        dir: &Path,
    ) -> Result<SnapshotMetadata, CheckpointError> {
        let metadata = self.load_metadata(dir)?;
        approximator
            .load(&dir.join(MODEL_FILE))
            .map_err(CheckpointError::ModelLoad)?;
        Ok(metadata)
    }

    /// List all complete snapshots sorted by step (ascending).
    pub fn list_snapshots(&self) -> Result<Vec<(PathBuf, SnapshotMetadata)>, CheckpointError> {
        let mut results = Vec::new();
        for entry in fs::read_dir(&self.config.checkpoint_dir)? {
            let path = entry?.path();
            if !path.is_dir() || path.extension().is_some_and(|e| e == "tmp") {
                continue;
            }
            if path.join(METADATA_FILE).exists() {
                let metadata = self.load_metadata(&path)?;
                results.push((path, metadata));
            }
        }
        results.sort_by(|(pa, a), (pb, b)| a.step.cmp(&b.step).then_with(|| pa.cmp(pb)));
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::DqnConfig;
    use crate::test_support::LinearStub;

    fn agent(name: &str) -> DqnAgent<LinearStub> {
        DqnAgent::new(
            name,
            3,
            DqnConfig::default(),
            LinearStub::new(3, 8),
            LinearStub::new(3, 8),
            0,
        )
    }

    fn manager(dir: &Path) -> CheckpointManager {
        CheckpointManager::new(CheckpointManagerConfig {
            checkpoint_dir: dir.to_path_buf(),
        })
        .unwrap()
    }

    #[test]
    fn test_snapshot_name() {
        assert_eq!(
            CheckpointManager::snapshot_name("dqn_selfplay0", SnapshotKind::History, 1200),
            "dqn_selfplay0_history_step1200"
        );
        assert_eq!(
            CheckpointManager::snapshot_name("dqn_selfplay0", SnapshotKind::Final, 50001),
            "dqn_selfplay0_final_step50001"
        );
    }

    #[test]
    fn test_save_and_restore_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        let mut agent = agent("a");
        for _ in 0..5 {
            agent.increment_step();
        }

        let path = manager
            .save_snapshot(&agent, SnapshotKind::History, Some(0.75))
            .unwrap();
        assert_eq!(path, dir.path().join("a_history_step5"));
        assert!(path.join(METADATA_FILE).exists());
        assert!(!dir.path().join("a_history_step5.tmp").exists());

        let mut restored = LinearStub::constant(3, vec![0.0; 8]);
        let meta = manager.restore(&mut restored, &path).unwrap();
        assert_eq!(meta.step, 5);
        assert_eq!(meta.mean_reward, Some(0.75));
        assert_eq!(meta.kind, SnapshotKind::History);
        assert_eq!(restored.get_weights(), agent.online().get_weights());
    }

    #[test]
    fn test_save_overwrites_existing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        let agent = agent("a");
        manager.save_snapshot(&agent, SnapshotKind::Final, None).unwrap();
        let path = manager.save_snapshot(&agent, SnapshotKind::Final, None).unwrap();
        assert_eq!(manager.load_metadata(&path).unwrap().kind, SnapshotKind::Final);
        assert_eq!(manager.list_snapshots().unwrap().len(), 1);
    }

    #[test]
    fn test_list_snapshots_sorted_by_step() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        // Directory names sort opposite to steps.
        for (name, steps) in [("c", 10u64), ("b", 20), ("a", 30)] {
            let mut agent = agent(name);
            for _ in 0..steps {
                agent.increment_step();
            }
            manager.save_snapshot(&agent, SnapshotKind::History, None).unwrap();
        }
        // Leftover temp dirs are ignored.
        fs::create_dir_all(dir.path().join("d_history_step99.tmp")).unwrap();

        let listed = manager.list_snapshots().unwrap();
        let steps: Vec<u64> = listed.iter().map(|(_, m)| m.step).collect();
        assert_eq!(steps, vec![10, 20, 30]);
        assert_eq!(listed[0].1.agent_name, "c");
    }

    #[test]
    fn test_load_metadata_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        let err = manager.load_metadata(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, CheckpointError::DirNotFound(_)));
    }

    #[test]
    fn test_corrupt_metadata_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        let snapshot = dir.path().join("broken");
        fs::create_dir_all(&snapshot).unwrap();
        fs::write(snapshot.join(METADATA_FILE), "{ not json").unwrap();
        assert!(matches!(
            manager.load_metadata(&snapshot).unwrap_err(),
            CheckpointError::MetadataParse { .. }
        ));
    }
}
