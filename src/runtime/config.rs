//! Consolidated runtime configuration: the one struct every default
//! scattered across the core's components lives on. Loaded from an
//! optional JSON file and then layered with CLI overrides — the file
//! overrides built-in defaults, CLI flags override the file.

use agentcore_aggregation::WakeConfig;
use agentcore_core::{CoreError, Priority, Result};
use agentcore_stress::StressConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    pub hz: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self { hz: 1.0 }
    }
}

/// Mirrors `agentcore_queue::PruneConfig` in a serde-friendly shape; the
/// queue crate's own type doesn't carry derives since nothing inside it
/// needs to round-trip through JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneConfig {
    pub max_age_ms: i64,
    pub max_priority_to_drop: Priority,
    pub emergency_threshold: Option<usize>,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self { max_age_ms: 300_000, max_priority_to_drop: Priority::Low, emergency_threshold: None }
    }
}

impl From<&PruneConfig> for agentcore_queue::PruneConfig {
    fn from(c: &PruneConfig) -> Self {
        agentcore_queue::PruneConfig {
            max_age_ms: c.max_age_ms,
            max_priority_to_drop: c.max_priority_to_drop,
            emergency_threshold: c.emergency_threshold,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub aggregation_window_ms: u64,
    pub prune: PruneConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { aggregation_window_ms: 5000, prune: PruneConfig::default() }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub max_fires_per_tick: u32,
    pub fired_ids_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_fires_per_tick: 10, fired_ids_capacity: 64 }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginDefaultsConfig {
    pub max_schedules: u32,
    pub max_storage_mb: f64,
    pub signals_per_minute: u32,
}

impl Default for PluginDefaultsConfig {
    fn default() -> Self {
        Self { max_schedules: 100, max_storage_mb: 16.0, signals_per_minute: 120 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipientConfig {
    pub save_debounce_ms: u64,
    pub primary_recipient_id: Option<String>,
}

impl Default for RecipientConfig {
    fn default() -> Self {
        Self { save_debounce_ms: 1000, primary_recipient_id: None }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CognitionConfig {
    pub confidence_retry_threshold: f64,
    pub enable_smart_retry: bool,
    pub tool_timeout_ms: u64,
    /// How long a `defer` intent's ack blocks its trigger signals before
    /// lapsing, absent an earlier override-delta move.
    pub defer_duration_ms: i64,
}

impl Default for CognitionConfig {
    fn default() -> Self {
        Self { confidence_retry_threshold: 0.6, enable_smart_retry: true, tool_timeout_ms: 30_000, defer_duration_ms: 900_000 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub tick: TickConfig,
    pub queue: QueueConfig,
    pub wake: WakeConfig,
    pub stress: StressConfig,
    pub scheduler: SchedulerConfig,
    pub plugins: PluginDefaultsConfig,
    pub recipients: RecipientConfig,
    pub cognition: CognitionConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick: TickConfig::default(),
            queue: QueueConfig::default(),
            wake: WakeConfig::default(),
            stress: StressConfig::default(),
            scheduler: SchedulerConfig::default(),
            plugins: PluginDefaultsConfig::default(),
            recipients: RecipientConfig::default(),
            cognition: CognitionConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Loads `path` if given; a missing path falls back to built-in
    /// defaults (CLI flags still apply on top).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(CoreError::Io)?;
        serde_json::from_str(&raw).map_err(CoreError::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_consolidated_literals() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.tick.hz, 1.0);
        assert_eq!(cfg.queue.aggregation_window_ms, 5000);
        assert_eq!(cfg.wake.ack_override_delta, 0.25);
        assert_eq!(cfg.scheduler.max_fires_per_tick, 10);
        assert_eq!(cfg.plugins.max_schedules, 100);
    }

    #[test]
    fn missing_path_falls_back_to_defaults() {
        let cfg = RuntimeConfig::load(None).unwrap();
        assert_eq!(cfg.recipients.primary_recipient_id, None);
    }

    #[test]
    fn loads_partial_json_with_serde_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.json");
        std::fs::write(&path, r#"{"tick": {"hz": 2.0}}"#).unwrap();
        let cfg = RuntimeConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.tick.hz, 2.0);
        assert_eq!(cfg.queue.aggregation_window_ms, 5000);
    }
}
