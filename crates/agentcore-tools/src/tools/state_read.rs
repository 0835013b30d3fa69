//! state_read tool — read-only view of alertness, stress tier, and pending context.

use crate::handles::StateProvider;
use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct StateReadTool {
    provider: Arc<dyn StateProvider>,
}

impl StateReadTool {
    pub fn new(provider: Arc<dyn StateProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl Tool for StateReadTool {
    fn name(&self) -> &str {
        "state_read"
    }

    fn description(&self) -> &str {
        "Read the current alertness level, stress tier, and pending context. Takes no arguments."
    }

    fn prompt(&self) -> &str {
        "Call state_read before deciding how to respond if alertness or stress might change the right action."
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
        })
    }

    async fn execute(&self, _args: Value) -> ToolResult {
        let snapshot = self.provider.snapshot();
        match serde_json::to_value(&snapshot) {
            Ok(v) => ToolResult::Json(v),
            Err(e) => ToolResult::error(format!("failed to serialize state: {e}")),
        }
    }
}
