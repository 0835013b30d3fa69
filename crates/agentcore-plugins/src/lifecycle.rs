//! The hooks a loaded plugin module implements. `PluginLoader` (C13)
//! orchestrates these against the storage/scheduler/emitter primitives
//! it constructs for each plugin.

use crate::emitter::SignalEmitter;
use crate::event_schema::SchemaError;
use crate::scheduler::{MigrationBundle, PluginScheduler};
use crate::storage::{PluginStorage, StoredValue};
use async_trait::async_trait;
use semver::Version;
use serde_json::Value;

/// Handed to a plugin at `activate()` time: its own storage/scheduler/
/// emitter primitives, plus a callback bound to this plugin's id for
/// registering event-kind validators (`registerEventSchema`, §6).
pub struct ActivationBundle<'a> {
    pub plugin_id: &'a str,
    pub version: &'a Version,
    pub storage: &'a mut PluginStorage,
    pub scheduler: &'a mut PluginScheduler,
    pub emitter: &'a mut SignalEmitter,
    pub register_event_schema: &'a mut dyn FnMut(String, Value) -> Result<(), SchemaError>,
}

pub struct MigrationData {
    pub storage: Vec<(String, StoredValue)>,
    pub schedules: MigrationBundle,
    pub config: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("activation failed: {0}")]
    ActivationFailed(String),
    #[error("migration failed: {0}")]
    MigrationFailed(String),
}

/// Implemented by a loaded plugin module. Storage/scheduler/emitter
/// access happens through the primitives the loader passes at
/// activation time, not through this trait directly.
#[async_trait]
pub trait PluginLifecycle: Send + Sync {
    async fn activate(&self, bundle: ActivationBundle<'_>) -> Result<(), LifecycleError>;
    async fn deactivate(&self);

    /// `None` means this plugin cannot be hot-swapped; the loader
    /// refuses a hot-swap onto a plugin whose new version lacks this.
    async fn migrate(&self, _old_version: &Version, _data: MigrationData) -> Result<(), LifecycleError> {
        Err(LifecycleError::MigrationFailed("plugin does not implement migrate".into()))
    }

    fn supports_migration(&self) -> bool {
        false
    }
}
