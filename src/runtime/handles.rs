//! Concrete collaborator implementations plugging this process's own
//! state, memory, scheduling, and motor-task tracking into the cognition
//! tool loop's abstract seams (`agentcore_tools::handles`).

use agentcore_core::AgentState;
use agentcore_plugins::scheduler::{PluginScheduler, ScheduleOptions};
use agentcore_stress::StressHandle;
use agentcore_tools::{
    MemoryStore, MotorTaskInfo, MotorTaskManager, MotorTaskStatus, ScheduleHandleInfo,
    SchedulingHandle, StateProvider, StateSnapshot,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

/// Read-only view over the shared `AgentState` and the stress monitor's
/// current tier mask, for the `state_read` tool.
pub struct CoreStateProvider {
    agent_state: Arc<StdMutex<AgentState>>,
    stress: StressHandle,
    pending_context: Arc<StdMutex<Value>>,
}

impl CoreStateProvider {
    pub fn new(agent_state: Arc<StdMutex<AgentState>>, stress: StressHandle) -> Self {
        Self { agent_state, stress, pending_context: Arc::new(StdMutex::new(Value::Null)) }
    }
}

impl StateProvider for CoreStateProvider {
    fn snapshot(&self) -> StateSnapshot {
        let state = self.agent_state.lock().unwrap();
        let level = *self.stress.levels.borrow();
        let tiers = level.active_tiers();
        let mut active_tiers = Vec::new();
        if tiers.autonomic {
            active_tiers.push("autonomic".to_string());
        }
        if tiers.aggregation {
            active_tiers.push("aggregation".to_string());
        }
        if tiers.cognition {
            active_tiers.push("cognition".to_string());
        }
        if tiers.smart {
            active_tiers.push("smart".to_string());
        }
        StateSnapshot {
            alertness: state.alertness,
            stress_level: level,
            active_tiers,
            pending_context: self.pending_context.lock().unwrap().clone(),
        }
    }
}

/// In-memory scratch space for facts the cognition layer wants to carry
/// across ticks, distinct from plugin storage (C10).
#[derive(Default)]
pub struct CoreMemoryStore {
    data: Mutex<HashMap<String, Value>>,
}

#[async_trait]
impl MemoryStore for CoreMemoryStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.data.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), String> {
        self.data.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, String> {
        Ok(self.data.lock().await.remove(key).is_some())
    }

    async fn list_keys(&self, prefix: &str) -> Vec<String> {
        self.data.lock().await.keys().filter(|k| k.starts_with(prefix)).cloned().collect()
    }
}

/// Routes the `scheduling` tool through a scheduler primitive owned by a
/// synthetic `core.cognition` plugin id — the dispatcher's own schedules
/// live alongside real plugin schedules without needing a loaded plugin.
pub struct CoreSchedulingHandle {
    scheduler: Arc<Mutex<PluginScheduler>>,
}

impl CoreSchedulingHandle {
    pub fn new(scheduler: Arc<Mutex<PluginScheduler>>) -> Self {
        Self { scheduler }
    }
}

#[async_trait]
impl SchedulingHandle for CoreSchedulingHandle {
    async fn schedule(&self, spec: Value) -> Result<ScheduleHandleInfo, String> {
        let fire_at = spec
            .get("fire_at")
            .and_then(Value::as_str)
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .ok_or_else(|| "fire_at must be an RFC3339 timestamp".to_string())?;
        let timezone = spec.get("timezone").and_then(Value::as_str).unwrap_or("UTC").to_string();
        let payload = spec.get("payload").cloned().unwrap_or(Value::Null);

        let opts = ScheduleOptions { fire_at, timezone, recurrence: None, payload };
        let mut scheduler = self.scheduler.lock().await;
        let id = scheduler.schedule(opts).map_err(|e| e.to_string())?;
        Ok(ScheduleHandleInfo { id, next_fire_at: Some(fire_at) })
    }

    async fn cancel(&self, id: &str) -> Result<bool, String> {
        Ok(self.scheduler.lock().await.cancel(id))
    }

    async fn list(&self) -> Vec<ScheduleHandleInfo> {
        self.scheduler
            .lock()
            .await
            .get_schedules()
            .into_iter()
            .map(|s| ScheduleHandleInfo { id: s.id.clone(), next_fire_at: Some(s.fire_at) })
            .collect()
    }
}

/// Tracks outward, possibly long-running actions the cognition dispatch
/// initiated, so later ticks can check on or cancel them.
#[derive(Default)]
pub struct CoreMotorTaskManager {
    tasks: Mutex<HashMap<String, MotorTaskInfo>>,
}

#[async_trait]
impl MotorTaskManager for CoreMotorTaskManager {
    async fn start(&self, description: &str) -> MotorTaskInfo {
        let info = MotorTaskInfo {
            id: format!("task_{}", uuid::Uuid::new_v4()),
            description: description.to_string(),
            status: MotorTaskStatus::Pending,
            result: None,
        };
        self.tasks.lock().await.insert(info.id.clone(), info.clone());
        info
    }

    async fn update(&self, id: &str, status: MotorTaskStatus, result: Option<Value>) -> Result<(), String> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks.get_mut(id).ok_or_else(|| format!("no such motor task: {id}"))?;
        task.status = status;
        task.result = result;
        Ok(())
    }

    async fn get(&self, id: &str) -> Option<MotorTaskInfo> {
        self.tasks.lock().await.get(id).cloned()
    }

    async fn cancel(&self, id: &str) -> Result<bool, String> {
        let mut tasks = self.tasks.lock().await;
        match tasks.get_mut(id) {
            Some(task) => {
                task.status = MotorTaskStatus::Cancelled;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_active(&self) -> Vec<MotorTaskInfo> {
        self.tasks
            .lock()
            .await
            .values()
            .filter(|t| matches!(t.status, MotorTaskStatus::Pending | MotorTaskStatus::Running))
            .cloned()
            .collect()
    }
}
