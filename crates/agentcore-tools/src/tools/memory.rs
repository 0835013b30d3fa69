//! memory tool — get/set/delete/list on the cognition layer's own scratch store.

use crate::handles::MemoryStore;
use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct MemoryTool {
    store: Arc<dyn MemoryStore>,
}

impl MemoryTool {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Tool for MemoryTool {
    fn name(&self) -> &str {
        "memory"
    }

    fn description(&self) -> &str {
        "Get, set, delete, or list keys in persistent memory. action: get|set|delete|list."
    }

    fn prompt(&self) -> &str {
        "Use memory to carry durable facts across ticks (e.g. stated preferences). \
         Don't store anything that's already recoverable from state_read."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": { "type": "string", "enum": ["get", "set", "delete", "list"] },
                "key": { "type": "string" },
                "value": {},
                "prefix": { "type": "string" }
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
            "get" => {
                let Some(key) = args.get("key").and_then(|v| v.as_str()) else {
                    return ToolResult::error("get requires key");
                };
                match self.store.get(key).await {
                    Some(v) => ToolResult::Json(v),
                    None => ToolResult::text("null"),
                }
            }
            "set" => {
                let Some(key) = args.get("key").and_then(|v| v.as_str()) else {
                    return ToolResult::error("set requires key");
                };
                let value = args.get("value").cloned().unwrap_or(Value::Null);
                match self.store.set(key, value).await {
                    Ok(()) => ToolResult::text("ok"),
                    Err(e) => ToolResult::error(e),
                }
            }
            "delete" => {
                let Some(key) = args.get("key").and_then(|v| v.as_str()) else {
                    return ToolResult::error("delete requires key");
                };
                match self.store.delete(key).await {
                    Ok(existed) => ToolResult::Json(json!({ "deleted": existed })),
                    Err(e) => ToolResult::error(e),
                }
            }
            "list" => {
                let prefix = args.get("prefix").and_then(|v| v.as_str()).unwrap_or("");
                let keys = self.store.list_keys(prefix).await;
                ToolResult::Json(json!({ "keys": keys }))
            }
            other => ToolResult::error(format!("unknown action: {other}")),
        }
    }
}
