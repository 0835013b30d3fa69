//! scheduling tool — create, cancel, and list future wakeups through the scheduler primitive.

use crate::handles::SchedulingHandle;
use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct SchedulingTool {
    handle: Arc<dyn SchedulingHandle>,
}

impl SchedulingTool {
    pub fn new(handle: Arc<dyn SchedulingHandle>) -> Self {
        Self { handle }
    }
}

#[async_trait::async_trait]
impl Tool for SchedulingTool {
    fn name(&self) -> &str {
        "scheduling"
    }

    fn description(&self) -> &str {
        "Create, cancel, or list scheduled wakeups. action: create|cancel|list. \
         create takes a schedule spec object (one_shot, daily, weekly, or monthly)."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": { "type": "string", "enum": ["create", "cancel", "list"] },
                "spec": { "type": "object" },
                "id": { "type": "string" }
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
            "create" => {
                let Some(spec) = args.get("spec").cloned() else {
                    return ToolResult::error("create requires spec");
                };
                match self.handle.schedule(spec).await {
                    Ok(info) => ToolResult::Json(serde_json::to_value(info).unwrap_or(Value::Null)),
                    Err(e) => ToolResult::error(e),
                }
            }
            "cancel" => {
                let Some(id) = args.get("id").and_then(|v| v.as_str()) else {
                    return ToolResult::error("cancel requires id");
                };
                match self.handle.cancel(id).await {
                    Ok(existed) => ToolResult::Json(json!({ "cancelled": existed })),
                    Err(e) => ToolResult::error(e),
                }
            }
            "list" => {
                let entries = self.handle.list().await;
                ToolResult::Json(json!({ "schedules": entries }))
            }
            other => ToolResult::error(format!("unknown action: {other}")),
        }
    }
}
