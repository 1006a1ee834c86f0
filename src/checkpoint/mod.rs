//! Snapshot persistence: named, step-tagged approximator snapshots with
//! JSON metadata.

mod manager;
mod metadata;

pub use manager::{CheckpointManager, CheckpointManagerConfig};
pub use metadata::{SnapshotKind, SnapshotMetadata};
