//! Plugin runtime: namespaced storage (C10), per-plugin scheduler (C11)
//! and scheduler service (C12), and the plugin loader (C13) with its
//! rate-limited signal emitter (§4.4.5).

pub mod emitter;
pub mod event_schema;
pub mod lifecycle;
pub mod loader;
pub mod manifest;
pub mod persistence;
pub mod recurrence;
pub mod scheduler;
pub mod scheduler_service;
pub mod storage;

pub use emitter::{EmitError, SignalEmitter};
pub use event_schema::{EventSchemaRegistry, SchemaError, ValidationOutcome};
pub use lifecycle::{ActivationBundle, LifecycleError, MigrationData, PluginLifecycle};
pub use loader::{LoadedPlugin, LoaderError, PluginHealth, PluginLoader};
pub use manifest::{check_dependencies, validate_manifest, DependencyError, ManifestError, PluginDependency, PluginLimits, PluginManifest};
pub use persistence::{load_snapshot, save_snapshot, PersistenceError, PluginLoaderSnapshot, PluginSnapshot};
pub use recurrence::{MonthlyConstraint, Recurrence};
pub use scheduler::{DueEntry, MigrationBundle, PluginScheduler, Schedule, ScheduleOptions, SchedulerError};
pub use scheduler_service::{FiredEvent, SchedulerService, SchedulerServiceConfig};
pub use storage::{OrderBy, PluginStorage, QueryOptions, StorageError, StoredValue};
