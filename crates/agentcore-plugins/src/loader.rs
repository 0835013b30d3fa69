//! Plugin Loader (C13): manifest validation, activation, hot-swap with
//! rollback, unload, event-schema registration/dispatch, and a
//! health-check snapshot.

use crate::emitter::SignalEmitter;
use crate::event_schema::{EventSchemaRegistry, SchemaError, ValidationOutcome};
use crate::lifecycle::{ActivationBundle, LifecycleError, MigrationData, PluginLifecycle};
use crate::manifest::{check_dependencies, validate_manifest, PluginManifest};
use crate::persistence::{PluginLoaderSnapshot, PluginSnapshot};
use crate::scheduler::PluginScheduler;
use crate::storage::PluginStorage;
use agentcore_core::Signal;
use chrono::{DateTime, Utc};
use semver::Version;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("manifest invalid: {0}")]
    InvalidManifest(String),
    #[error("dependency unsatisfied: {0}")]
    DependencyUnsatisfied(String),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("plugin {0} not loaded")]
    NotLoaded(String),
    #[error("plugin {0} already loaded")]
    AlreadyLoaded(String),
    #[error("hot-swap refused: new plugin does not implement migrate")]
    NoMigrateHook,
    #[error("hot-swap rolled back: {0}")]
    RolledBack(String),
    #[error(transparent)]
    InvalidEventSchema(#[from] SchemaError),
    #[error("plugin event rejected: {0}")]
    EventRejected(String),
    #[error("plugin event emission refused: {0}")]
    EmitRejected(String),
}

pub struct LoadedPlugin {
    pub manifest: PluginManifest,
    pub lifecycle: Arc<dyn PluginLifecycle>,
    pub storage: PluginStorage,
    pub scheduler: PluginScheduler,
    pub emitter: SignalEmitter,
    pub activated_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct PluginHealth {
    pub plugin_id: String,
    pub loaded: bool,
    pub version: Option<Version>,
    pub activated_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

pub struct PluginLoader {
    plugins: HashMap<String, LoadedPlugin>,
    event_schemas: EventSchemaRegistry,
    default_warning_size_mb: f64,
    default_max_size_mb: f64,
    default_max_schedules: usize,
    default_signals_per_minute: u32,
    /// Snapshots loaded from disk at startup for plugins not yet loaded.
    /// Applied the moment a matching plugin id is `load()`ed, then
    /// dropped from this map so a later hot-swap doesn't see stale state.
    pending_snapshots: HashMap<String, PluginSnapshot>,
}

impl PluginLoader {
    pub fn new(default_warning_size_mb: f64, default_max_size_mb: f64, default_max_schedules: usize, default_signals_per_minute: u32) -> Self {
        Self {
            plugins: HashMap::new(),
            event_schemas: EventSchemaRegistry::new(),
            default_warning_size_mb,
            default_max_size_mb,
            default_max_schedules,
            default_signals_per_minute,
            pending_snapshots: HashMap::new(),
        }
    }

    /// Seeds the loader with a snapshot read from disk at startup. Call
    /// before any `load()` calls; restored storage/schedule state is
    /// applied to a plugin the moment it loads.
    pub fn with_snapshot(mut self, snapshot: PluginLoaderSnapshot) -> Self {
        self.pending_snapshots = snapshot.0;
        self
    }

    /// Builds a snapshot of every loaded plugin's storage and scheduler
    /// state, suitable for `persistence::save_snapshot`.
    pub fn export_snapshot(&self) -> PluginLoaderSnapshot {
        PluginLoaderSnapshot(
            self.plugins
                .iter()
                .map(|(id, p)| (id.clone(), PluginSnapshot { storage: p.storage.get_all_data(), schedules: p.scheduler.get_migration_data() }))
                .collect(),
        )
    }

    fn loaded_versions(&self) -> HashMap<String, Version> {
        self.plugins.iter().map(|(id, p)| (id.clone(), p.manifest.version.clone())).collect()
    }

    fn primitive_limits(&self, manifest: &PluginManifest) -> (f64, f64, usize, u32) {
        let warning_mb = manifest.limits.warning_size_mb.unwrap_or(self.default_warning_size_mb);
        let max_mb = manifest.limits.max_size_mb.unwrap_or(self.default_max_size_mb);
        let max_schedules = manifest.limits.max_schedules.unwrap_or(self.default_max_schedules);
        let signals_per_minute = manifest.limits.signals_per_minute.unwrap_or(self.default_signals_per_minute);
        (warning_mb, max_mb, max_schedules, signals_per_minute)
    }

    pub async fn load(&mut self, manifest: PluginManifest, lifecycle: Arc<dyn PluginLifecycle>, now: DateTime<Utc>) -> Result<(), LoaderError> {
        if self.plugins.contains_key(&manifest.id) {
            return Err(LoaderError::AlreadyLoaded(manifest.id));
        }
        validate_manifest(&manifest).map_err(|e| LoaderError::InvalidManifest(e.to_string()))?;
        check_dependencies(&manifest, &self.loaded_versions()).map_err(|e| LoaderError::DependencyUnsatisfied(e.to_string()))?;

        let (warning_mb, max_mb, max_schedules, signals_per_minute) = self.primitive_limits(&manifest);
        let mut storage = PluginStorage::new(&manifest.id, warning_mb, max_mb);
        let mut scheduler = PluginScheduler::new(&manifest.id, max_schedules);
        let mut emitter = SignalEmitter::new(&manifest.id, Some(signals_per_minute), now);

        if let Some(snapshot) = self.pending_snapshots.remove(&manifest.id) {
            storage.restore_data(snapshot.storage);
            scheduler.restore_from_migration(snapshot.schedules);
        }

        let plugin_id = manifest.id.clone();
        let event_schemas = &mut self.event_schemas;
        let mut register_cb = move |kind: String, schema: serde_json::Value| event_schemas.register_event_schema(kind, schema, Some(plugin_id.clone()));

        let activation = lifecycle
            .activate(ActivationBundle {
                plugin_id: &manifest.id,
                version: &manifest.version,
                storage: &mut storage,
                scheduler: &mut scheduler,
                emitter: &mut emitter,
                register_event_schema: &mut register_cb,
            })
            .await;
        if let Err(err) = activation {
            storage.clear();
            self.event_schemas.unregister_plugin(&manifest.id);
            return Err(LoaderError::Lifecycle(LifecycleError::ActivationFailed(format!("activation failed: {err}"))));
        }

        self.plugins.insert(manifest.id.clone(), LoadedPlugin { manifest, lifecycle, storage, scheduler, emitter, activated_at: now, last_error: None });
        Ok(())
    }

    pub async fn unload(&mut self, id: &str) -> Result<(), LoaderError> {
        let plugin = self.plugins.remove(id).ok_or_else(|| LoaderError::NotLoaded(id.to_string()))?;
        plugin.lifecycle.deactivate().await;
        self.event_schemas.unregister_plugin(id);
        Ok(())
    }

    /// Hot-swaps a loaded plugin for a new version at the same id. The
    /// new lifecycle must implement `migrate`; old state (storage and
    /// scheduler, read via their real `getAllData`/`getMigrationData`)
    /// is bundled and handed to it. On new-activation failure, rolls the
    /// old plugin back with its original bundle.
    pub async fn hot_swap(&mut self, id: &str, new_manifest: PluginManifest, new_lifecycle: Arc<dyn PluginLifecycle>, now: DateTime<Utc>) -> Result<(), LoaderError> {
        if !new_lifecycle.supports_migration() {
            return Err(LoaderError::NoMigrateHook);
        }
        let old = self.plugins.get(id).ok_or_else(|| LoaderError::NotLoaded(id.to_string()))?;
        let old_version = old.manifest.version.clone();
        let old_storage_backup = old.storage.get_all_data();
        let old_schedules_backup = old.scheduler.get_migration_data();
        let (old_warning_mb, old_max_mb, old_max_schedules, _) = self.primitive_limits(&old.manifest);

        let bundle = MigrationData { storage: old_storage_backup.clone(), schedules: old_schedules_backup.clone(), config: serde_json::json!({}) };

        if let Err(err) = new_lifecycle.migrate(&old_version, bundle).await {
            return Err(LoaderError::Lifecycle(err));
        }

        let old_plugin = self.plugins.remove(id).expect("checked above");
        old_plugin.lifecycle.deactivate().await;
        self.event_schemas.unregister_plugin(id);

        let (warning_mb, max_mb, max_schedules, signals_per_minute) = self.primitive_limits(&new_manifest);
        let mut new_storage = PluginStorage::new(&new_manifest.id, warning_mb, max_mb);
        new_storage.restore_data(old_storage_backup.clone());
        let mut new_scheduler = PluginScheduler::new(&new_manifest.id, max_schedules);
        new_scheduler.restore_from_migration(old_schedules_backup.clone());
        let mut new_emitter = SignalEmitter::new(&new_manifest.id, Some(signals_per_minute), now);

        let activation = {
            let plugin_id = new_manifest.id.clone();
            let event_schemas = &mut self.event_schemas;
            let mut register_cb = move |kind: String, schema: serde_json::Value| event_schemas.register_event_schema(kind, schema, Some(plugin_id.clone()));
            new_lifecycle
                .activate(ActivationBundle {
                    plugin_id: &new_manifest.id,
                    version: &new_manifest.version,
                    storage: &mut new_storage,
                    scheduler: &mut new_scheduler,
                    emitter: &mut new_emitter,
                    register_event_schema: &mut register_cb,
                })
                .await
        };

        match activation {
            Ok(()) => {
                self.plugins.insert(new_manifest.id.clone(), LoadedPlugin { manifest: new_manifest, lifecycle: new_lifecycle, storage: new_storage, scheduler: new_scheduler, emitter: new_emitter, activated_at: now, last_error: None });
                Ok(())
            }
            Err(err) => {
                error!(plugin_id = %id, %err, "hot-swap activation failed, rolling back");
                self.event_schemas.unregister_plugin(id);

                let mut rollback_storage = PluginStorage::new(&old_plugin.manifest.id, old_warning_mb, old_max_mb);
                rollback_storage.restore_data(old_storage_backup);
                let mut rollback_scheduler = PluginScheduler::new(&old_plugin.manifest.id, old_max_schedules);
                rollback_scheduler.restore_from_migration(old_schedules_backup);
                let mut rollback_emitter = old_plugin.emitter;

                let reactivation = {
                    let plugin_id = old_plugin.manifest.id.clone();
                    let event_schemas = &mut self.event_schemas;
                    let mut register_cb = move |kind: String, schema: serde_json::Value| event_schemas.register_event_schema(kind, schema, Some(plugin_id.clone()));
                    old_plugin
                        .lifecycle
                        .activate(ActivationBundle {
                            plugin_id: &old_plugin.manifest.id,
                            version: &old_version,
                            storage: &mut rollback_storage,
                            scheduler: &mut rollback_scheduler,
                            emitter: &mut rollback_emitter,
                            register_event_schema: &mut register_cb,
                        })
                        .await
                };
                if let Err(reactivate_err) = reactivation {
                    error!(plugin_id = %id, %reactivate_err, "rollback re-activation also failed");
                }
                self.plugins.insert(
                    id.to_string(),
                    LoadedPlugin {
                        manifest: old_plugin.manifest,
                        lifecycle: old_plugin.lifecycle,
                        storage: rollback_storage,
                        scheduler: rollback_scheduler,
                        emitter: rollback_emitter,
                        activated_at: old_plugin.activated_at,
                        last_error: Some(err.to_string()),
                    },
                );
                Err(LoaderError::RolledBack(err.to_string()))
            }
        }
    }

    pub fn get_plugin(&self, id: &str) -> Option<&LoadedPlugin> {
        self.plugins.get(id)
    }

    pub fn get_plugin_mut(&mut self, id: &str) -> Option<&mut LoadedPlugin> {
        self.plugins.get_mut(id)
    }

    /// `registerEventSchema(kind, schema, pluginId?)`: a standalone entry
    /// point for registering validators outside of a plugin's own
    /// `activate()` call (e.g. core-provided schemas).
    pub fn register_event_schema(&mut self, kind: String, schema: serde_json::Value, plugin_id: Option<String>) -> Result<(), LoaderError> {
        self.event_schemas.register_event_schema(kind, schema, plugin_id).map_err(LoaderError::from)
    }

    pub fn validate_plugin_event(&self, kind: &str, data: &serde_json::Value) -> ValidationOutcome {
        self.event_schemas.validate_plugin_event(kind, data)
    }

    /// Validates `payload` against any schema registered for `kind`, then
    /// emits it through the owning plugin's rate-limited emitter. A
    /// rejected event never reaches the emitter, so it never becomes a
    /// signal cognition could see.
    pub fn dispatch_plugin_event(&mut self, id: &str, kind: &str, payload: serde_json::Value, now: DateTime<Utc>) -> Result<Signal, LoaderError> {
        let validation = self.event_schemas.validate_plugin_event(kind, &payload);
        if !validation.valid {
            return Err(LoaderError::EventRejected(validation.error.unwrap_or_else(|| format!("no schema satisfied for event kind {kind}"))));
        }
        let plugin = self.plugins.get_mut(id).ok_or_else(|| LoaderError::NotLoaded(id.to_string()))?;
        plugin.emitter.emit(kind, payload, now).map_err(|e| LoaderError::EmitRejected(e.to_string()))
    }

    pub fn health_check(&self) -> Vec<PluginHealth> {
        let mut ids: Vec<&String> = self.plugins.keys().collect();
        ids.sort();
        ids.into_iter()
            .map(|id| {
                let p = &self.plugins[id];
                PluginHealth { plugin_id: id.clone(), loaded: true, version: Some(p.manifest.version.clone()), activated_at: Some(p.activated_at), last_error: p.last_error.clone() }
            })
            .collect()
    }
}
