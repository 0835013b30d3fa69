//! motor_task tool — start, update, check, cancel, and list outward actions
//! the agent has initiated that may outlive a single tick.

use crate::handles::{MotorTaskManager, MotorTaskStatus};
use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct MotorTaskTool {
    manager: Arc<dyn MotorTaskManager>,
}

impl MotorTaskTool {
    pub fn new(manager: Arc<dyn MotorTaskManager>) -> Self {
        Self { manager }
    }
}

fn parse_status(s: &str) -> Result<MotorTaskStatus, String> {
    match s {
        "pending" => Ok(MotorTaskStatus::Pending),
        "running" => Ok(MotorTaskStatus::Running),
        "completed" => Ok(MotorTaskStatus::Completed),
        "failed" => Ok(MotorTaskStatus::Failed),
        "cancelled" => Ok(MotorTaskStatus::Cancelled),
        other => Err(format!("unknown status: {other}")),
    }
}

#[async_trait::async_trait]
impl Tool for MotorTaskTool {
    fn name(&self) -> &str {
        "motor_task"
    }

    fn description(&self) -> &str {
        "Track an outward action in progress. action: start|update|get|cancel|list_active."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": { "type": "string", "enum": ["start", "update", "get", "cancel", "list_active"] },
                "id": { "type": "string" },
                "description": { "type": "string" },
                "status": { "type": "string", "enum": ["pending", "running", "completed", "failed", "cancelled"] },
                "result": {}
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let action = match args.get("action").and_then(|v| v.as_str()) {
            Some(a) => a,
            None => return ToolResult::error("missing required parameter: action"),
        };

        match action {
            "start" => {
                let description = args.get("description").and_then(|v| v.as_str()).unwrap_or("");
                let info = self.manager.start(description).await;
                ToolResult::Json(serde_json::to_value(info).unwrap_or(Value::Null))
            }
            "update" => {
                let Some(id) = args.get("id").and_then(|v| v.as_str()) else {
                    return ToolResult::error("update requires id");
                };
                let Some(status_str) = args.get("status").and_then(|v| v.as_str()) else {
                    return ToolResult::error("update requires status");
                };
                let status = match parse_status(status_str) {
                    Ok(s) => s,
                    Err(e) => return ToolResult::error(e),
                };
                let result = args.get("result").cloned();
                match self.manager.update(id, status, result).await {
                    Ok(()) => ToolResult::text("ok"),
                    Err(e) => ToolResult::error(e),
                }
            }
            "get" => {
                let Some(id) = args.get("id").and_then(|v| v.as_str()) else {
                    return ToolResult::error("get requires id");
                };
                match self.manager.get(id).await {
                    Some(info) => ToolResult::Json(serde_json::to_value(info).unwrap_or(Value::Null)),
                    None => ToolResult::text("null"),
                }
            }
            "cancel" => {
                let Some(id) = args.get("id").and_then(|v| v.as_str()) else {
                    return ToolResult::error("cancel requires id");
                };
                match self.manager.cancel(id).await {
                    Ok(existed) => ToolResult::Json(json!({ "cancelled": existed })),
                    Err(e) => ToolResult::error(e),
                }
            }
            "list_active" => {
                let tasks = self.manager.list_active().await;
                ToolResult::Json(json!({ "tasks": tasks }))
            }
            other => ToolResult::error(format!("unknown action: {other}")),
        }
    }
}
