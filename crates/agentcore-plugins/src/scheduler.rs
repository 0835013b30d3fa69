//! Scheduler primitive (C11): per-plugin set of schedules, due-checking,
//! and at-most-once fire marking.

use crate::recurrence::Recurrence;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

const DEFAULT_FIRED_IDS_CAPACITY: usize = 64;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduleOptions {
    pub fire_at: DateTime<Utc>,
    pub timezone: String,
    pub recurrence: Option<Recurrence>,
    pub payload: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub fire_at: DateTime<Utc>,
    pub timezone: String,
    pub recurrence: Option<Recurrence>,
    pub payload: serde_json::Value,
    /// Not `#[serde(skip)]`: this dedup set is exactly what makes
    /// at-most-once firing survive a restart from persisted state.
    fired_ids: VecDeque<Uuid>,
}

#[derive(Clone, Debug)]
pub struct DueEntry {
    pub schedule_id: String,
    pub fire_id: Uuid,
    pub payload: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MigrationBundle {
    pub schedules: Vec<Schedule>,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("schedule limit reached: {max} active schedules")]
    LimitReached { max: usize },
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
}

pub struct PluginScheduler {
    plugin_id: String,
    schedules: HashMap<String, Schedule>,
    max_schedules: usize,
    fired_ids_capacity: usize,
}

impl PluginScheduler {
    pub fn new(plugin_id: &str, max_schedules: usize) -> Self {
        Self { plugin_id: plugin_id.to_string(), schedules: HashMap::new(), max_schedules, fired_ids_capacity: DEFAULT_FIRED_IDS_CAPACITY }
    }

    pub fn schedule(&mut self, opts: ScheduleOptions) -> Result<String, SchedulerError> {
        opts.timezone.parse::<Tz>().map_err(|_| SchedulerError::InvalidTimezone(opts.timezone.clone()))?;
        if self.schedules.len() >= self.max_schedules {
            return Err(SchedulerError::LimitReached { max: self.max_schedules });
        }
        let id = format!("sched_{}", Uuid::new_v4());
        self.schedules.insert(
            id.clone(),
            Schedule { id: id.clone(), fire_at: opts.fire_at, timezone: opts.timezone, recurrence: opts.recurrence, payload: opts.payload, fired_ids: VecDeque::new() },
        );
        Ok(id)
    }

    pub fn cancel(&mut self, id: &str) -> bool {
        self.schedules.remove(id).is_some()
    }

    pub fn get_schedules(&self) -> Vec<&Schedule> {
        self.schedules.values().collect()
    }

    /// Returns due entries and advances recurring schedules' `fireAt` to
    /// their next occurrence. Non-recurring schedules remain due (and
    /// will be returned again) until the caller cancels them.
    pub fn check_due_schedules(&mut self, now: DateTime<Utc>) -> Vec<DueEntry> {
        let mut due = Vec::new();
        for schedule in self.schedules.values_mut() {
            if schedule.fire_at <= now {
                let fire_id = Uuid::new_v4();
                due.push(DueEntry { schedule_id: schedule.id.clone(), fire_id, payload: schedule.payload.clone() });

                if let Some(recurrence) = &schedule.recurrence {
                    if let Ok(tz) = schedule.timezone.parse::<Tz>() {
                        schedule.fire_at = recurrence.next_fire_after(schedule.fire_at, tz);
                    }
                }
            }
        }
        due
    }

    /// Caller MUST call this before emitting the signal for a due entry.
    /// Repeated calls with the same `fire_id` are no-ops.
    pub fn mark_fired(&mut self, id: &str, fire_id: Uuid, _now: DateTime<Utc>) {
        let Some(schedule) = self.schedules.get_mut(id) else { return };
        if schedule.fired_ids.contains(&fire_id) {
            return;
        }
        schedule.fired_ids.push_back(fire_id);
        while schedule.fired_ids.len() > self.fired_ids_capacity {
            schedule.fired_ids.pop_front();
        }
    }

    pub fn was_fired(&self, id: &str, fire_id: Uuid) -> bool {
        self.schedules.get(id).map(|s| s.fired_ids.contains(&fire_id)).unwrap_or(false)
    }

    pub fn get_migration_data(&self) -> MigrationBundle {
        MigrationBundle { schedules: self.schedules.values().cloned().collect() }
    }

    pub fn restore_from_migration(&mut self, bundle: MigrationBundle) {
        self.schedules.clear();
        for schedule in bundle.schedules {
            self.schedules.insert(schedule.id.clone(), schedule);
        }
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(fire_at: DateTime<Utc>) -> ScheduleOptions {
        ScheduleOptions { fire_at, timezone: "UTC".into(), recurrence: None, payload: serde_json::json!({}) }
    }

    #[test]
    fn schedule_becomes_due_at_fire_at() {
        let mut sched = PluginScheduler::new("p1", 10);
        let now = Utc::now();
        let id = sched.schedule(opts(now - chrono::Duration::seconds(1))).unwrap();
        let due = sched.check_due_schedules(now);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].schedule_id, id);
    }

    #[test]
    fn non_recurring_schedule_stays_due_until_cancelled() {
        let mut sched = PluginScheduler::new("p1", 10);
        let now = Utc::now();
        sched.schedule(opts(now - chrono::Duration::seconds(1))).unwrap();
        assert_eq!(sched.check_due_schedules(now).len(), 1);
        assert_eq!(sched.check_due_schedules(now).len(), 1);
    }

    #[test]
    fn recurring_schedule_advances_fire_at() {
        let mut sched = PluginScheduler::new("p1", 10);
        let now = Utc::now();
        let id = sched.schedule(ScheduleOptions {
            fire_at: now - chrono::Duration::seconds(1),
            timezone: "UTC".into(),
            recurrence: Some(Recurrence::Daily { interval: 1 }),
            payload: serde_json::json!({}),
        }).unwrap();
        sched.check_due_schedules(now);
        let schedule = sched.get_schedules().into_iter().find(|s| s.id == id).unwrap();
        assert!(schedule.fire_at > now);
    }

    #[test]
    fn mark_fired_is_idempotent_per_fire_id() {
        let mut sched = PluginScheduler::new("p1", 10);
        let id = sched.schedule(opts(Utc::now())).unwrap();
        let fire_id = Uuid::new_v4();
        sched.mark_fired(&id, fire_id, Utc::now());
        sched.mark_fired(&id, fire_id, Utc::now());
        assert!(sched.was_fired(&id, fire_id));
    }

    #[test]
    fn schedule_rejects_past_limit() {
        let mut sched = PluginScheduler::new("p1", 1);
        sched.schedule(opts(Utc::now())).unwrap();
        assert!(sched.schedule(opts(Utc::now())).is_err());
    }

    #[test]
    fn fired_ids_trimmed_to_capacity() {
        let mut sched = PluginScheduler::new("p1", 10);
        sched.fired_ids_capacity = 2;
        let id = sched.schedule(opts(Utc::now())).unwrap();
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for fire_id in &ids {
            sched.mark_fired(&id, *fire_id, Utc::now());
        }
        assert!(!sched.was_fired(&id, ids[0]));
        assert!(sched.was_fired(&id, *ids.last().unwrap()));
    }
}
