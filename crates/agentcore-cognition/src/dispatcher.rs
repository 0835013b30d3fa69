//! Cognition Dispatcher (C15): builds context into an LLM conversation,
//! runs the tool loop, and gates low-confidence terminal results behind a
//! smart-retry with a higher-capability model.

use crate::context::{CognitionContext, CognitionResult, Intent, TerminalPayload};
use crate::final_tool::{final_tool_schema, parse_terminal_payload, FINAL_TOOL_NAME};
use crate::schema::parse_and_validate;
use agentcore_llm::{AccumulatedToolCall, ContentBlock, LlmContent, LlmMessage, LlmProvider, LlmRequest, LlmTool, StreamDelta};
use agentcore_tools::ToolRegistry;
use futures::StreamExt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub struct DispatcherConfig {
    pub confidence_retry_threshold: f64,
    pub tool_timeout_ms: u64,
    pub max_tool_iterations: usize,
    pub default_model: String,
    pub smart_model: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            confidence_retry_threshold: 0.6,
            tool_timeout_ms: 30_000,
            max_tool_iterations: 8,
            default_model: "claude-3-5-sonnet-20241022".to_string(),
            smart_model: "claude-3-5-sonnet-20241022".to_string(),
        }
    }
}

pub struct CognitionDispatcher<P: LlmProvider> {
    provider: P,
    tools: ToolRegistry,
    config: DispatcherConfig,
}

impl<P: LlmProvider> CognitionDispatcher<P> {
    pub fn new(provider: P, tools: ToolRegistry, config: DispatcherConfig) -> Self {
        Self { provider, tools, config }
    }

    pub async fn process(&self, ctx: CognitionContext) -> CognitionResult {
        let first = self.run_turn(&ctx, &self.config.default_model).await;

        match first {
            TurnOutcome::Terminal { confidence, response, intents } => {
                if confidence < self.config.confidence_retry_threshold && ctx.runtime_config.enable_smart_retry {
                    let retried = self.run_turn(&ctx, &self.config.smart_model).await;
                    match retried {
                        TurnOutcome::Terminal { confidence, response, intents } => {
                            CognitionResult { confidence, response, intents, used_smart_retry: true }
                        }
                        TurnOutcome::Malformed => CognitionResult::malformed(),
                    }
                } else {
                    CognitionResult { confidence, response, intents, used_smart_retry: false }
                }
            }
            TurnOutcome::Malformed => CognitionResult::malformed(),
        }
    }

    fn build_prompt(&self, ctx: &CognitionContext) -> String {
        let trigger_summary: Vec<String> = ctx.trigger_signals.iter().map(|s| format!("{} from {}", s.signal_type, s.source)).collect();
        format!(
            "wake reason: {:?}\ntrigger signals: {}\nagent state: alertness={:.2} contact_pressure={:.2} social_debt={:.2} energy={:.2}\ncorrelation id: {}",
            ctx.wake_reason,
            trigger_summary.join(", "),
            ctx.agent_state.alertness,
            ctx.agent_state.contact_pressure,
            ctx.agent_state.social_debt,
            ctx.agent_state.energy,
            ctx.correlation_id,
        )
    }

    fn tool_definitions(&self) -> Vec<LlmTool> {
        let mut defs = self.tools.get_definitions();
        defs.push(LlmTool { name: FINAL_TOOL_NAME.to_string(), description: "End the turn with a final decision.".to_string(), input_schema: final_tool_schema() });
        defs
    }

    async fn run_turn(&self, ctx: &CognitionContext, model: &str) -> TurnOutcome {
        let mut messages = vec![LlmMessage { role: "user".to_string(), content: LlmContent::Text(self.build_prompt(ctx)) }];

        for iteration in 0..self.config.max_tool_iterations {
            let request = LlmRequest { model: model.to_string(), messages: messages.clone(), tools: Some(self.tool_definitions()), ..Default::default() };

            let stream = match self.provider.complete_stream(request, None).await {
                Ok(s) => s,
                Err(err) => {
                    warn!(%err, iteration, "cognition LLM call failed");
                    return TurnOutcome::Malformed;
                }
            };

            let (text, tool_calls) = drain_stream(stream).await;

            if let Some(final_call) = tool_calls.iter().find(|tc| tc.name == FINAL_TOOL_NAME) {
                return self.handle_terminal(final_call).await;
            }

            if tool_calls.is_empty() {
                // No tool call and no terminal tool: the model produced
                // plain text without deciding; treat as malformed rather
                // than guessing at a response.
                let _ = text;
                return TurnOutcome::Malformed;
            }

            let blocks: Vec<ContentBlock> = tool_calls.iter().map(|tc| ContentBlock::ToolUse { id: tc.id.clone(), name: tc.name.clone(), input: tc.parse_arguments().unwrap_or_default() }).collect();
            messages.push(LlmMessage { role: "assistant".to_string(), content: LlmContent::Blocks(blocks) });

            let mut result_blocks = Vec::new();
            for call in &tool_calls {
                let (content, is_error) = self.execute_tool_call(call).await;
                result_blocks.push(ContentBlock::ToolResult { tool_use_id: call.id.clone(), content, is_error: Some(is_error) });
            }
            messages.push(LlmMessage { role: "user".to_string(), content: LlmContent::Blocks(result_blocks) });
        }

        warn!("cognition tool loop exceeded max iterations without reaching a terminal tool");
        TurnOutcome::Malformed
    }

    async fn handle_terminal(&self, call: &AccumulatedToolCall) -> TurnOutcome {
        let Ok(args) = parse_and_validate(&call.arguments, &final_tool_schema()) else {
            return TurnOutcome::Malformed;
        };
        match parse_terminal_payload(&args) {
            Some(TerminalPayload::Respond { text, confidence, .. }) => {
                TurnOutcome::Terminal { confidence, response: Some(text), intents: vec![] }
            }
            Some(TerminalPayload::NoAction) => TurnOutcome::Terminal { confidence: 1.0, response: None, intents: vec![] },
            Some(TerminalPayload::Defer { reason }) => {
                TurnOutcome::Terminal { confidence: 1.0, response: None, intents: vec![Intent { kind: "defer".to_string(), payload: serde_json::json!({"reason": reason}) }] }
            }
            None => TurnOutcome::Malformed,
        }
    }

    async fn execute_tool_call(&self, call: &AccumulatedToolCall) -> (String, bool) {
        let Some(tool) = self.tools.get(&call.name) else {
            return (format!("tool_invocation_error: unknown tool {}", call.name), true);
        };

        let args = match parse_and_validate(&call.arguments, &tool.input_schema()) {
            Ok(args) => args,
            Err(err) => return (format!("tool_invocation_error: {err}"), true),
        };

        let cancel = CancellationToken::new();
        let timeout = Duration::from_millis(self.config.tool_timeout_ms);
        match tokio::time::timeout(timeout, self.tools.execute_cancellable(&call.name, args, cancel.clone())).await {
            Ok(result) => (result.to_content_string(), result.is_error()),
            Err(_) => {
                cancel.cancel();
                ("tool_invocation_error: timed out".to_string(), true)
            }
        }
    }
}

enum TurnOutcome {
    Terminal { confidence: f64, response: Option<String>, intents: Vec<Intent> },
    Malformed,
}

async fn drain_stream(stream: agentcore_llm::LlmStream) -> (String, Vec<AccumulatedToolCall>) {
    tokio::pin!(stream);
    let mut text = String::new();
    let mut tool_calls = Vec::new();
    let mut current: Option<AccumulatedToolCall> = None;

    while let Some(delta) = stream.next().await {
        match delta {
            Ok(StreamDelta::Text(chunk)) => text.push_str(&chunk),
            Ok(StreamDelta::Thinking(_)) => {}
            Ok(StreamDelta::ToolCallStart { id, name }) => {
                current = Some(AccumulatedToolCall { id, name, arguments: String::new() });
            }
            Ok(StreamDelta::ToolCallDelta { id: _, arguments }) => {
                if let Some(tool) = current.as_mut() {
                    tool.arguments.push_str(&arguments);
                }
            }
            Ok(StreamDelta::ToolCallEnd { id: _ }) => {
                if let Some(tool) = current.take() {
                    tool_calls.push(tool);
                }
            }
            Ok(StreamDelta::Done { .. }) => {}
            Ok(StreamDelta::Error(err)) => warn!(%err, "llm stream reported an error delta"),
            Err(err) => warn!(%err, "llm stream error"),
        }
    }

    (text, tool_calls)
}
