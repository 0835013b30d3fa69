//! Scheduler Service (C12): owns one `PluginScheduler` per loaded plugin,
//! ticks them in order, and emits `plugin_event` signals for due fires.

use crate::scheduler::PluginScheduler;
use agentcore_core::{Priority, Signal, SignalData, SignalMetrics, Source};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::warn;
use uuid::Uuid;

pub struct SchedulerServiceConfig {
    pub max_fires_per_tick: usize,
}

impl Default for SchedulerServiceConfig {
    fn default() -> Self {
        Self { max_fires_per_tick: 10 }
    }
}

pub struct FiredEvent {
    pub plugin_id: String,
    pub schedule_id: String,
    pub fire_id: Uuid,
    pub signal: Signal,
}

#[derive(Default)]
pub struct SchedulerService {
    schedulers: HashMap<String, PluginScheduler>,
    /// Preserves registration order so `tick()` iterates plugins
    /// deterministically.
    order: Vec<String>,
    paused: HashSet<String>,
    pending_unregister: HashSet<String>,
    config: SchedulerServiceConfig,
}

impl SchedulerService {
    pub fn new(config: SchedulerServiceConfig) -> Self {
        Self { config, ..Default::default() }
    }

    pub fn register_scheduler(&mut self, plugin_id: &str, scheduler: PluginScheduler) {
        if !self.schedulers.contains_key(plugin_id) {
            self.order.push(plugin_id.to_string());
        }
        self.pending_unregister.remove(plugin_id);
        self.schedulers.insert(plugin_id.to_string(), scheduler);
    }

    pub fn queue_unregister(&mut self, plugin_id: &str) {
        self.pending_unregister.insert(plugin_id.to_string());
    }

    pub fn clear_pending_unregister(&mut self, plugin_id: &str) {
        self.pending_unregister.remove(plugin_id);
    }

    pub fn pause_plugin(&mut self, plugin_id: &str) {
        self.paused.insert(plugin_id.to_string());
    }

    pub fn resume_plugin(&mut self, plugin_id: &str) {
        self.paused.remove(plugin_id);
    }

    /// Called at the start of each tick; unregister errors (a plugin id
    /// not present) are logged, never propagated.
    pub fn apply_pending_changes(&mut self) {
        let pending: Vec<String> = self.pending_unregister.drain().collect();
        for plugin_id in pending {
            if self.schedulers.remove(&plugin_id).is_none() {
                warn!(%plugin_id, "queued scheduler unregister for a plugin with no registered scheduler");
            }
            self.order.retain(|id| id != &plugin_id);
            self.paused.remove(&plugin_id);
        }
    }

    /// For each unpaused plugin in registration order, checks due
    /// schedules and, up to `maxFiresPerTick` total, marks them fired
    /// and builds the `plugin_event` signal for the caller to publish
    /// and hand to the plugin's `onEvent` callback.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<FiredEvent> {
        let mut fired = Vec::new();
        let mut total_fired = 0usize;

        for plugin_id in self.order.clone() {
            if self.paused.contains(&plugin_id) {
                continue;
            }
            let Some(scheduler) = self.schedulers.get_mut(&plugin_id) else { continue };
            let due = scheduler.check_due_schedules(now);

            for entry in due {
                if total_fired >= self.config.max_fires_per_tick {
                    break;
                }
                scheduler.mark_fired(&entry.schedule_id, entry.fire_id, now);
                total_fired += 1;

                let signal = build_plugin_event_signal(&plugin_id, &entry.schedule_id, entry.fire_id, entry.payload, now);
                fired.push(FiredEvent { plugin_id: plugin_id.clone(), schedule_id: entry.schedule_id, fire_id: entry.fire_id, signal });
            }
        }

        fired
    }
}

fn build_plugin_event_signal(plugin_id: &str, schedule_id: &str, fire_id: Uuid, payload: serde_json::Value, now: DateTime<Utc>) -> Signal {
    Signal {
        id: Uuid::new_v4(),
        signal_type: "plugin_event".to_string(),
        source: Source::Plugin,
        timestamp: now,
        priority: Priority::Normal,
        metrics: SignalMetrics { value: 1.0, rate_of_change: None, confidence: 1.0 },
        data: SignalData {
            kind: "plugin_event".to_string(),
            payload: serde_json::json!({"pluginId": plugin_id, "scheduleId": schedule_id, "fireId": fire_id, "payload": payload}),
            channel: None,
        },
        correlation_id: None,
        expires_at: now + chrono::Duration::seconds(60),
    }
}
