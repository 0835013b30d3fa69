//! Collaborator traits the cognition tools dispatch through.
//!
//! The tool loop (C15) is a contract: it names tools but does not own the
//! layers those tools read from or act on. Each trait here is the narrow
//! seam a concrete core-loop wiring plugs into; tools hold a `Arc<dyn Trait>`
//! and never reach into queue/registry internals directly.

use agentcore_core::StressLevel;
use async_trait::async_trait;
use serde_json::Value;

/// A point-in-time view of the state a cognition dispatch reasons about.
#[derive(Clone, Debug, serde::Serialize)]
pub struct StateSnapshot {
    pub alertness: f64,
    pub stress_level: StressLevel,
    pub active_tiers: Vec<String>,
    pub pending_context: Value,
}

/// Read-only access to current runtime state for the `state_read` tool.
pub trait StateProvider: Send + Sync {
    fn snapshot(&self) -> StateSnapshot;
}

/// Keyed, namespaced memory distinct from plugin storage (C10) — this is
/// the cognition layer's own scratch space for facts worth carrying
/// across ticks (e.g. "user prefers terse replies").
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value) -> Result<(), String>;
    async fn delete(&self, key: &str) -> Result<bool, String>;
    async fn list_keys(&self, prefix: &str) -> Vec<String>;
}

/// Returns current wall-clock time; injectable so tests don't depend on
/// the real clock.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> chrono::DateTime<chrono::Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ScheduleHandleInfo {
    pub id: String,
    pub next_fire_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Seam into the scheduler primitive (C11/C12) for the `scheduling` tool.
#[async_trait]
pub trait SchedulingHandle: Send + Sync {
    async fn schedule(&self, spec: Value) -> Result<ScheduleHandleInfo, String>;
    async fn cancel(&self, id: &str) -> Result<bool, String>;
    async fn list(&self) -> Vec<ScheduleHandleInfo>;
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorTaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct MotorTaskInfo {
    pub id: String,
    pub description: String,
    pub status: MotorTaskStatus,
    pub result: Option<Value>,
}

/// Seam for tracking outward, possibly long-running actions the agent has
/// initiated (e.g. "sending a message", "running a plugin action") so the
/// cognition loop can check on or cancel them across ticks.
#[async_trait]
pub trait MotorTaskManager: Send + Sync {
    async fn start(&self, description: &str) -> MotorTaskInfo;
    async fn update(&self, id: &str, status: MotorTaskStatus, result: Option<Value>) -> Result<(), String>;
    async fn get(&self, id: &str) -> Option<MotorTaskInfo>;
    async fn cancel(&self, id: &str) -> Result<bool, String>;
    async fn list_active(&self) -> Vec<MotorTaskInfo>;
}
