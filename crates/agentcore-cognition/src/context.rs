//! `CognitionContext`/`CognitionResult` — the dispatcher's input/output
//! contract (C15, §4.9).

use agentcore_aggregation::WakeReason;
use agentcore_core::{AgentState, Signal, SignalAggregate, Source};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct CognitionRuntimeConfig {
    pub enable_smart_retry: bool,
}

pub struct CognitionContext {
    pub aggregates: HashMap<(String, Source), SignalAggregate>,
    pub trigger_signals: Vec<Signal>,
    pub wake_reason: WakeReason,
    pub agent_state: AgentState,
    pub correlation_id: uuid::Uuid,
    pub runtime_config: CognitionRuntimeConfig,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Active,
    AwaitingAnswer,
    Closed,
    Idle,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminalPayload {
    Respond { text: String, conversation_status: ConversationStatus, confidence: f64 },
    NoAction,
    Defer { reason: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Intent {
    pub kind: String,
    pub payload: serde_json::Value,
}

pub struct CognitionResult {
    pub confidence: f64,
    pub response: Option<String>,
    pub intents: Vec<Intent>,
    pub used_smart_retry: bool,
}

impl CognitionResult {
    pub fn malformed() -> Self {
        Self { confidence: 0.0, response: None, intents: vec![], used_smart_retry: false }
    }
}
