//! The terminal `final` tool: the one tool name that ends the dispatcher's
//! tool loop instead of continuing it. It isn't registered on the shared
//! `ToolRegistry` (it has no independent side effect) — the dispatcher
//! recognizes it by name before delegating to the registry.

use crate::context::{ConversationStatus, TerminalPayload};
use serde_json::Value;

pub const FINAL_TOOL_NAME: &str = "final";

pub fn final_tool_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "type": {"type": "string", "enum": ["respond", "no_action", "defer"]},
            "text": {"type": "string"},
            "conversation_status": {"type": "string", "enum": ["active", "awaiting_answer", "closed", "idle"]},
            "confidence": {"type": "number", "minimum": 0, "maximum": 1},
            "reason": {"type": "string"}
        },
        "required": ["type"]
    })
}

/// Parses validated `final` tool arguments into a discriminated payload.
/// Returns `None` on anything that doesn't cleanly match one of the three
/// shapes — the caller must treat that as malformed terminal output.
pub fn parse_terminal_payload(args: &Value) -> Option<TerminalPayload> {
    match args.get("type").and_then(Value::as_str)? {
        "respond" => {
            let text = args.get("text")?.as_str()?.to_string();
            let status = match args.get("conversation_status").and_then(Value::as_str) {
                Some("active") => ConversationStatus::Active,
                Some("awaiting_answer") => ConversationStatus::AwaitingAnswer,
                Some("closed") => ConversationStatus::Closed,
                Some("idle") | None => ConversationStatus::Idle,
                Some(_) => return None,
            };
            let confidence = args.get("confidence").and_then(Value::as_f64).unwrap_or(0.0).clamp(0.0, 1.0);
            Some(TerminalPayload::Respond { text, conversation_status: status, confidence })
        }
        "no_action" => Some(TerminalPayload::NoAction),
        "defer" => {
            let reason = args.get("reason").and_then(Value::as_str).unwrap_or_default().to_string();
            Some(TerminalPayload::Defer { reason })
        }
        _ => None,
    }
}
