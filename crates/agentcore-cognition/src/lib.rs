//! Cognition Dispatcher (C15): the contract between a wake decision and
//! an LLM-driven tool loop that produces a response, intents, and a
//! confidence score.

mod context;
mod dispatcher;
mod final_tool;
mod schema;

pub use context::{CognitionContext, CognitionResult, CognitionRuntimeConfig, ConversationStatus, Intent, TerminalPayload, WakeReason};
pub use dispatcher::{CognitionDispatcher, DispatcherConfig};
pub use final_tool::{final_tool_schema, parse_terminal_payload, FINAL_TOOL_NAME};
pub use schema::{parse_and_validate, validate, ValidationError};
