//! time tool — current wall-clock time, in UTC and an optional IANA zone.

use crate::handles::Clock;
use crate::registry::{Tool, ToolResult};
use chrono_tz::Tz;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct TimeTool {
    clock: Arc<dyn Clock>,
}

impl TimeTool {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait::async_trait]
impl Tool for TimeTool {
    fn name(&self) -> &str {
        "time"
    }

    fn description(&self) -> &str {
        "Get the current time. Optionally pass an IANA timezone to get the local wall-clock time there."
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "timezone": { "type": "string", "description": "IANA zone, e.g. America/New_York" }
            },
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let now = self.clock.now_utc();

        let Some(tz_name) = args.get("timezone").and_then(|v| v.as_str()) else {
            return ToolResult::Json(json!({ "utc": now.to_rfc3339() }));
        };

        match tz_name.parse::<Tz>() {
            Ok(tz) => {
                let local = now.with_timezone(&tz);
                ToolResult::Json(json!({
                    "utc": now.to_rfc3339(),
                    "timezone": tz_name,
                    "local": local.to_rfc3339(),
                }))
            }
            Err(_) => ToolResult::error(format!("unknown IANA timezone: {tz_name}")),
        }
    }
}
