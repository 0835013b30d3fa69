//! Tests for the cognition tool surface: ToolRegistry plumbing and the five
//! default tools (state_read, memory, time, scheduling, motor_task) against
//! in-memory fakes of their collaborator traits.

use agentcore_core::StressLevel;
use agentcore_tools::{
    create_default_registry, Clock, CognitionCollaborators, MemoryStore, MotorTaskInfo,
    MotorTaskManager, MotorTaskStatus, ScheduleHandleInfo, SchedulingHandle, StateProvider,
    StateSnapshot, ToolRegistry, ToolResult,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

// ===========================================================================
// ToolResult
// ===========================================================================

#[test]
fn tool_result_text() {
    let r = ToolResult::text("hello");
    assert!(!r.is_error());
    assert_eq!(r.to_content_string(), "hello");
}

#[test]
fn tool_result_error() {
    let r = ToolResult::error("boom");
    assert!(r.is_error());
    assert_eq!(r.to_content_string(), "Error: boom");
}

#[test]
fn tool_result_json() {
    let r = ToolResult::Json(json!({"key": "value"}));
    assert!(!r.is_error());
    assert!(r.to_content_string().contains("\"key\""));
}

// ===========================================================================
// Fakes
// ===========================================================================

struct FixedState;

impl StateProvider for FixedState {
    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            alertness: 0.8,
            stress_level: StressLevel::Normal,
            active_tiers: vec!["autonomic".to_string(), "aggregation".to_string()],
            pending_context: json!({"topic": "none"}),
        }
    }
}

#[derive(Default)]
struct FakeMemory {
    data: Mutex<HashMap<String, Value>>,
}

#[async_trait]
impl MemoryStore for FakeMemory {
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

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
struct FakeScheduling {
    next_id: Mutex<u32>,
    scheduled: Mutex<Vec<ScheduleHandleInfo>>,
}

#[async_trait]
impl SchedulingHandle for FakeScheduling {
    async fn schedule(&self, spec: Value) -> Result<ScheduleHandleInfo, String> {
        let fire_at = spec
            .get("fire_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| "fire_at must be an RFC3339 timestamp".to_string())?;
        let mut next_id = self.next_id.lock().await;
        *next_id += 1;
        let info = ScheduleHandleInfo { id: format!("sched_{next_id}"), next_fire_at: Some(fire_at) };
        self.scheduled.lock().await.push(info.clone());
        Ok(info)
    }

    async fn cancel(&self, id: &str) -> Result<bool, String> {
        let mut scheduled = self.scheduled.lock().await;
        let before = scheduled.len();
        scheduled.retain(|s| s.id != id);
        Ok(scheduled.len() != before)
    }

    async fn list(&self) -> Vec<ScheduleHandleInfo> {
        self.scheduled.lock().await.clone()
    }
}

#[derive(Default)]
struct FakeMotorTasks {
    tasks: Mutex<HashMap<String, MotorTaskInfo>>,
    next_id: Mutex<u32>,
}

#[async_trait]
impl MotorTaskManager for FakeMotorTasks {
    async fn start(&self, description: &str) -> MotorTaskInfo {
        let mut next_id = self.next_id.lock().await;
        *next_id += 1;
        let info = MotorTaskInfo {
            id: format!("task_{next_id}"),
            description: description.to_string(),
            status: MotorTaskStatus::Pending,
            result: None,
        };
        self.tasks.lock().await.insert(info.id.clone(), info.clone());
        info
    }

    async fn update(&self, id: &str, status: MotorTaskStatus, result: Option<Value>) -> Result<(), String> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks.get_mut(id).ok_or_else(|| format!("no such task: {id}"))?;
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

fn default_registry() -> ToolRegistry {
    let collaborators = CognitionCollaborators {
        state: Arc::new(FixedState),
        memory: Arc::new(FakeMemory::default()),
        clock: Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 7, 27, 12, 0, 0).unwrap())),
        scheduling: Arc::new(FakeScheduling::default()),
        motor_tasks: Arc::new(FakeMotorTasks::default()),
    };
    create_default_registry(collaborators)
}

// ===========================================================================
// ToolRegistry
// ===========================================================================

#[test]
fn default_registry_has_all_five_tools() {
    let reg = default_registry();
    let mut names = reg.list();
    names.sort();
    assert_eq!(names, vec!["memory", "motor_task", "scheduling", "state_read", "time"]);
}

#[test]
fn list_read_only_reports_state_read_and_time() {
    let reg = default_registry();
    let mut read_only = reg.list_read_only();
    read_only.sort();
    assert_eq!(read_only, vec!["state_read", "time"]);
}

#[tokio::test]
async fn execute_unknown_tool_errors() {
    let reg = default_registry();
    let result = reg.execute("nonexistent", json!({})).await;
    assert!(result.is_error());
}

#[tokio::test]
async fn execute_cancellable_races_cancellation() {
    let reg = default_registry();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = reg.execute_cancellable("time", json!({}), cancel).await;
    // Either the tool wins the race or cancellation does; both are valid
    // outcomes, but the call must not hang or panic.
    assert!(!result.to_content_string().is_empty());
}

#[test]
fn get_definitions_matches_registered_tools() {
    let reg = default_registry();
    assert_eq!(reg.get_definitions().len(), 5);
}

// ===========================================================================
// state_read
// ===========================================================================

#[tokio::test]
async fn state_read_reports_snapshot() {
    let reg = default_registry();
    let result = reg.execute("state_read", json!({})).await;
    let ToolResult::Json(v) = result else { panic!("expected json result") };
    assert_eq!(v["alertness"], json!(0.8));
    assert_eq!(v["active_tiers"], json!(["autonomic", "aggregation"]));
}

// ===========================================================================
// memory
// ===========================================================================

#[tokio::test]
async fn memory_set_then_get_round_trips() {
    let reg = default_registry();
    let set = reg.execute("memory", json!({"action": "set", "key": "name", "value": "nyx"})).await;
    assert!(!set.is_error());

    let get = reg.execute("memory", json!({"action": "get", "key": "name"})).await;
    let ToolResult::Json(v) = get else { panic!("expected json result") };
    assert_eq!(v, json!("nyx"));
}

#[tokio::test]
async fn memory_get_missing_key_returns_null() {
    let reg = default_registry();
    let result = reg.execute("memory", json!({"action": "get", "key": "absent"})).await;
    assert_eq!(result.to_content_string(), "null");
}

#[tokio::test]
async fn memory_list_filters_by_prefix() {
    let reg = default_registry();
    reg.execute("memory", json!({"action": "set", "key": "pref:tone", "value": "terse"})).await;
    reg.execute("memory", json!({"action": "set", "key": "other", "value": 1})).await;

    let result = reg.execute("memory", json!({"action": "list", "prefix": "pref:"})).await;
    let ToolResult::Json(v) = result else { panic!("expected json result") };
    assert_eq!(v["keys"], json!(["pref:tone"]));
}

#[tokio::test]
async fn memory_missing_action_errors() {
    let reg = default_registry();
    let result = reg.execute("memory", json!({})).await;
    assert!(result.is_error());
}

// ===========================================================================
// time
// ===========================================================================

#[tokio::test]
async fn time_without_timezone_returns_utc_only() {
    let reg = default_registry();
    let result = reg.execute("time", json!({})).await;
    let ToolResult::Json(v) = result else { panic!("expected json result") };
    assert_eq!(v["utc"], json!("2026-07-27T12:00:00+00:00"));
    assert!(v.get("local").is_none());
}

#[tokio::test]
async fn time_with_known_timezone_includes_local() {
    let reg = default_registry();
    let result = reg.execute("time", json!({"timezone": "America/New_York"})).await;
    let ToolResult::Json(v) = result else { panic!("expected json result") };
    assert_eq!(v["local"], json!("2026-07-27T08:00:00-04:00"));
}

#[tokio::test]
async fn time_with_unknown_timezone_errors() {
    let reg = default_registry();
    let result = reg.execute("time", json!({"timezone": "Not/AZone"})).await;
    assert!(result.is_error());
}

// ===========================================================================
// scheduling
// ===========================================================================

#[tokio::test]
async fn scheduling_create_then_list_then_cancel() {
    let reg = default_registry();
    let create = reg
        .execute("scheduling", json!({"action": "create", "spec": {"fire_at": "2026-08-01T09:00:00Z"}}))
        .await;
    let ToolResult::Json(created) = create else { panic!("expected json result") };
    let id = created["id"].as_str().unwrap().to_string();

    let list = reg.execute("scheduling", json!({"action": "list"})).await;
    let ToolResult::Json(listed) = list else { panic!("expected json result") };
    assert_eq!(listed["schedules"].as_array().unwrap().len(), 1);

    let cancel = reg.execute("scheduling", json!({"action": "cancel", "id": id})).await;
    let ToolResult::Json(cancelled) = cancel else { panic!("expected json result") };
    assert_eq!(cancelled["cancelled"], json!(true));
}

#[tokio::test]
async fn scheduling_create_without_fire_at_errors() {
    let reg = default_registry();
    let result = reg.execute("scheduling", json!({"action": "create", "spec": {}})).await;
    assert!(result.is_error());
}

// ===========================================================================
// motor_task
// ===========================================================================

#[tokio::test]
async fn motor_task_full_lifecycle() {
    let reg = default_registry();
    let start = reg.execute("motor_task", json!({"action": "start", "description": "send a reply"})).await;
    let ToolResult::Json(started) = start else { panic!("expected json result") };
    let id = started["id"].as_str().unwrap().to_string();
    assert_eq!(started["status"], json!("pending"));

    let active = reg.execute("motor_task", json!({"action": "list_active"})).await;
    let ToolResult::Json(active) = active else { panic!("expected json result") };
    assert_eq!(active["tasks"].as_array().unwrap().len(), 1);

    let update = reg
        .execute("motor_task", json!({"action": "update", "id": id, "status": "completed", "result": {"ok": true}}))
        .await;
    assert!(!update.is_error());

    let get = reg.execute("motor_task", json!({"action": "get", "id": id})).await;
    let ToolResult::Json(fetched) = get else { panic!("expected json result") };
    assert_eq!(fetched["status"], json!("completed"));

    let active_after = reg.execute("motor_task", json!({"action": "list_active"})).await;
    let ToolResult::Json(active_after) = active_after else { panic!("expected json result") };
    assert!(active_after["tasks"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn motor_task_update_unknown_id_errors() {
    let reg = default_registry();
    let result = reg
        .execute("motor_task", json!({"action": "update", "id": "task_404", "status": "failed"}))
        .await;
    assert!(result.is_error());
}
