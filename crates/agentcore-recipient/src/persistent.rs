//! Persistent variant of the recipient registry: loads a JSON snapshot at
//! init, debounces saves behind mutation, and flushes atomically on
//! shutdown. A corrupt snapshot starts empty with an error logged rather
//! than failing startup or loading a partial registry.

use crate::error::Result;
use crate::record::RecipientRecord;
use crate::registry::RecipientRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Duration;
use tracing::{error, warn};

pub struct PersistentRecipientRegistry {
    inner: Arc<Mutex<RecipientRegistry>>,
    save_tx: mpsc::UnboundedSender<()>,
}

impl PersistentRecipientRegistry {
    /// Loads `path` if present. A missing file starts empty; a corrupt
    /// file starts empty with an error log (never a partial load).
    pub async fn load(path: PathBuf, save_debounce_ms: u64) -> Self {
        let mut registry = RecipientRegistry::new();

        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<Vec<RecipientRecord>>(&raw) {
                Ok(records) => {
                    if let Err(err) = registry.import(records) {
                        error!(%err, path = %path.display(), "recipient registry snapshot failed validation; starting empty");
                        registry = RecipientRegistry::new();
                    }
                }
                Err(err) => {
                    error!(%err, path = %path.display(), "recipient registry snapshot is not valid JSON; starting empty");
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                error!(%err, path = %path.display(), "failed to read recipient registry snapshot; starting empty");
            }
        }

        let inner = Arc::new(Mutex::new(registry));
        let (save_tx, save_rx) = mpsc::unbounded_channel();
        spawn_debounced_saver(inner.clone(), path, Duration::from_millis(save_debounce_ms), save_rx);

        Self { inner, save_tx }
    }

    pub fn inner(&self) -> Arc<Mutex<RecipientRegistry>> {
        self.inner.clone()
    }

    /// Signals the background saver that state changed; the actual write
    /// happens after the debounce window, coalescing rapid mutations.
    pub fn mark_dirty(&self) {
        let _ = self.save_tx.send(());
    }

    /// Writes the current snapshot immediately, bypassing the debounce.
    /// Call on shutdown so no pending mutation is lost.
    pub async fn flush(&self, path: &Path) -> Result<()> {
        let registry = self.inner.lock().await;
        write_snapshot_atomic(path, &registry.export()).await
    }
}

fn spawn_debounced_saver(
    registry: Arc<Mutex<RecipientRegistry>>,
    path: PathBuf,
    debounce: Duration,
    mut save_rx: mpsc::UnboundedReceiver<()>,
) {
    tokio::spawn(async move {
        while save_rx.recv().await.is_some() {
            // Drain any further signals that arrived during the debounce
            // window so a burst of mutations triggers one write.
            tokio::time::sleep(debounce).await;
            while save_rx.try_recv().is_ok() {}

            let snapshot = registry.lock().await.export();
            if let Err(err) = write_snapshot_atomic(&path, &snapshot).await {
                warn!(%err, path = %path.display(), "debounced recipient registry save failed");
            }
        }
    });
}

async fn write_snapshot_atomic(path: &Path, records: &[RecipientRecord]) -> Result<()> {
    use crate::error::RecipientError;

    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await.map_err(|e| RecipientError::Persistence(e.to_string()))?;
    }
    let json = serde_json::to_string_pretty(records).map_err(|e| RecipientError::Persistence(e.to_string()))?;

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, json).await.map_err(|e| RecipientError::Persistence(e.to_string()))?;
    tokio::fs::rename(&tmp_path, path).await.map_err(|e| RecipientError::Persistence(e.to_string()))?;
    Ok(())
}
