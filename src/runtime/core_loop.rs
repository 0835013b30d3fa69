//! The tick-driven core loop (C14): one invocation per tick drains queued
//! events into signals, runs them through the filter pipeline and the
//! autonomic layer, folds in due plugin schedules, asks the aggregation
//! layer whether to wake, and — if cognition is enabled at the current
//! stress level — dispatches to an LLM-driven tool loop.

use crate::runtime::config::RuntimeConfig;
use crate::runtime::handles::{CoreMemoryStore, CoreMotorTaskManager, CoreSchedulingHandle, CoreStateProvider};
use agentcore_aggregation::{Ack, AckRegistry, AckType, AggregationLayer};
use agentcore_autonomic::{
    contact_pressure_neuron, social_debt_neuron, AlertnessNeuron, ExpiryFilter, FilterContext,
    FilterRegistry, NeuronRegistry, PatternBreakNeuron, PriorityEscalationFilter,
};
use agentcore_cognition::{CognitionContext, CognitionDispatcher, CognitionRuntimeConfig, DispatcherConfig};
use agentcore_core::{AgentState, CorrelationId, Event, EventMeta, Result as CoreResult, Signal, SignalData, SignalMetrics};
use agentcore_llm::AnthropicProvider;
use agentcore_plugins::loader::PluginLoader;
use agentcore_plugins::persistence::{load_snapshot, save_snapshot};
use agentcore_plugins::scheduler::PluginScheduler;
use agentcore_plugins::scheduler_service::{SchedulerService, SchedulerServiceConfig};
use agentcore_queue::{PriorityEventQueue, SignalBus};
use agentcore_recipient::PersistentRecipientRegistry;
use agentcore_stress::{spawn_stress_monitor, StressHandle};
use agentcore_tools::{create_default_registry, CognitionCollaborators, SystemClock};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Translates a drained `Event` into the `Signal` every downstream layer
/// consumes. One event always yields exactly one signal.
fn event_to_signal(event: Event, correlation_id: CorrelationId, aggregation_window_ms: u64) -> Signal {
    let value = event.meta.as_ref().and_then(|m| m.aggregated_count).map(|c| c as f64).unwrap_or(1.0);
    let expires_at = event
        .meta
        .as_ref()
        .and_then(|m: &EventMeta| m.expires_at_override)
        .unwrap_or_else(|| event.timestamp + Duration::milliseconds(aggregation_window_ms as i64));

    Signal {
        id: uuid::Uuid::new_v4(),
        signal_type: event.event_type.clone(),
        source: event.source,
        timestamp: event.timestamp,
        priority: event.priority,
        metrics: SignalMetrics { value, rate_of_change: None, confidence: 1.0 },
        data: SignalData { kind: event.event_type, payload: event.payload, channel: event.channel },
        correlation_id: Some(correlation_id),
        expires_at,
    }
}

pub struct CoreLoop {
    config: RuntimeConfig,
    queue: PriorityEventQueue,
    filters: FilterRegistry,
    neurons: NeuronRegistry,
    aggregation: AggregationLayer,
    acks: AckRegistry,
    agent_state: Arc<StdMutex<AgentState>>,
    scheduler_service: SchedulerService,
    plugin_loader: PluginLoader,
    recipients: PersistentRecipientRegistry,
    recipient_snapshot_path: PathBuf,
    plugin_snapshot_path: PathBuf,
    signal_bus: SignalBus,
    stress: StressHandle,
    dispatcher: Option<CognitionDispatcher<AnthropicProvider>>,
}

impl CoreLoop {
    pub async fn new(config: RuntimeConfig, recipient_snapshot_path: PathBuf, plugin_snapshot_path: PathBuf, cancel: CancellationToken) -> Self {
        let mut neurons = NeuronRegistry::new();
        neurons.register_neuron(Arc::new(AlertnessNeuron::default()));
        neurons.register_neuron(Arc::new(contact_pressure_neuron(config.wake.contact_pressure_threshold)));
        neurons.register_neuron(Arc::new(social_debt_neuron(config.wake.social_debt_threshold)));
        neurons.register_neuron(Arc::new(PatternBreakNeuron::new("pattern_break", 3.0, 5_000)));
        neurons.apply_pending_changes();
        neurons
            .validate_required_neurons()
            .expect("the alertness neuron must be registered before the core loop starts");

        let mut filters = FilterRegistry::new();
        filters.register(Box::new(PriorityEscalationFilter));
        filters.register(Box::new(ExpiryFilter));

        let recipients =
            PersistentRecipientRegistry::load(recipient_snapshot_path.clone(), config.recipients.save_debounce_ms).await;
        let plugin_snapshot = load_snapshot(&plugin_snapshot_path).await;

        let stress = spawn_stress_monitor(config.stress, cancel.clone());
        let agent_state = Arc::new(StdMutex::new(AgentState::default()));
        let cognition_scheduler = Arc::new(Mutex::new(PluginScheduler::new("core.cognition", config.plugins.max_schedules as usize)));

        let dispatcher = std::env::var("ANTHROPIC_API_KEY").ok().map(|key| {
            let provider = AnthropicProvider::new(key);
            let collaborators = CognitionCollaborators {
                state: Arc::new(CoreStateProvider::new(agent_state.clone(), stress.clone())),
                memory: Arc::new(CoreMemoryStore::default()),
                clock: Arc::new(SystemClock),
                scheduling: Arc::new(CoreSchedulingHandle::new(cognition_scheduler.clone())),
                motor_tasks: Arc::new(CoreMotorTaskManager::default()),
            };
            let tools = create_default_registry(collaborators);
            CognitionDispatcher::new(
                provider,
                tools,
                DispatcherConfig {
                    confidence_retry_threshold: config.cognition.confidence_retry_threshold,
                    tool_timeout_ms: config.cognition.tool_timeout_ms,
                    ..DispatcherConfig::default()
                },
            )
        });
        if dispatcher.is_none() {
            warn!("ANTHROPIC_API_KEY not set; cognition dispatch disabled, wakes will be logged only");
        }

        Self {
            queue: PriorityEventQueue::new(config.queue.aggregation_window_ms),
            filters,
            neurons,
            aggregation: AggregationLayer::new(),
            acks: AckRegistry::new(),
            agent_state,
            scheduler_service: SchedulerService::new(SchedulerServiceConfig { max_fires_per_tick: config.scheduler.max_fires_per_tick as usize }),
            plugin_loader: PluginLoader::new(
                config.plugins.max_storage_mb * 0.75,
                config.plugins.max_storage_mb,
                config.plugins.max_schedules as usize,
                config.plugins.signals_per_minute,
            )
            .with_snapshot(plugin_snapshot),
            recipients,
            recipient_snapshot_path,
            plugin_snapshot_path,
            signal_bus: SignalBus::new(),
            stress,
            dispatcher,
            config,
        }
    }

    pub fn push_event(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn signal_bus_mut(&mut self) -> &mut SignalBus {
        &mut self.signal_bus
    }

    pub fn plugin_loader_mut(&mut self) -> &mut PluginLoader {
        &mut self.plugin_loader
    }

    pub fn scheduler_service_mut(&mut self) -> &mut SchedulerService {
        &mut self.scheduler_service
    }

    pub fn recipients(&self) -> &PersistentRecipientRegistry {
        &self.recipients
    }

    /// Flushes the recipient registry and plugin state snapshots
    /// immediately; call on graceful shutdown so no pending mutation
    /// (debounced recipient saves, or any plugin storage/schedule change
    /// since startup) is lost.
    pub async fn shutdown(&self) -> CoreResult<()> {
        self.recipients
            .flush(&self.recipient_snapshot_path)
            .await
            .map_err(|e| agentcore_core::CoreError::internal(e.to_string()))?;
        save_snapshot(&self.plugin_snapshot_path, &self.plugin_loader.export_snapshot())
            .await
            .map_err(|e| agentcore_core::CoreError::internal(e.to_string()))
    }

    fn neuron_values(&self, state: &AgentState) -> HashMap<String, f64> {
        let mut values = HashMap::with_capacity(3 + state.metrics.len());
        values.insert("alertness".to_string(), state.alertness);
        values.insert("contact_pressure".to_string(), state.contact_pressure);
        values.insert("social_debt".to_string(), state.social_debt);
        for (key, value) in &state.metrics {
            values.insert(key.clone(), *value);
        }
        values
    }

    /// Runs one tick: `applyPendingChanges` → drain events → filter →
    /// autonomic → aggregation/wake → cognition, honoring the stress
    /// monitor's active-tier mask at each gated stage.
    pub async fn tick(&mut self) {
        let now: DateTime<Utc> = Utc::now();
        self.neurons.apply_pending_changes();
        self.scheduler_service.apply_pending_changes();
        let correlation_id = CorrelationId::new();

        self.queue.aggregate();
        self.queue.prune(&(&self.config.queue.prune).into(), now);

        let mut drained_signals = Vec::new();
        while let Some(event) = self.queue.pull() {
            drained_signals.push(event_to_signal(event, correlation_id.clone(), self.config.queue.aggregation_window_ms));
        }

        let tiers = self.stress.current_tiers();
        let filtered = self.filters.process(drained_signals, &FilterContext { now });

        let state_snapshot = self.agent_state.lock().unwrap().clone();

        let neuron_signals = if tiers.autonomic {
            let values = self.neuron_values(&state_snapshot);
            self.neurons.check_all(&values, state_snapshot.alertness, now, correlation_id.clone())
        } else {
            Vec::new()
        };

        let mut combined = filtered;
        combined.extend(neuron_signals);

        for fired in self.scheduler_service.tick(now) {
            combined.push(fired.signal);
        }

        for signal in &combined {
            self.signal_bus.publish(signal.clone()).await;
        }

        if !tiers.aggregation {
            return;
        }

        let wake_config = self.config.wake;
        let wake_result = self.aggregation.process(combined, &state_snapshot, &mut self.acks, &wake_config, now);

        if !wake_result.wake {
            return;
        }
        if !tiers.cognition {
            info!(reason = ?wake_result.reason, "wake suppressed: cognition tier disabled under current stress level");
            return;
        }
        let Some(dispatcher) = &self.dispatcher else {
            info!(reason = ?wake_result.reason, "wake triggered but no cognition dispatcher is configured");
            return;
        };

        let enable_smart_retry = self.config.cognition.enable_smart_retry && tiers.smart;
        let trigger_signals = wake_result.trigger_signals.clone();
        let ctx = CognitionContext {
            aggregates: wake_result.aggregates,
            trigger_signals: wake_result.trigger_signals,
            wake_reason: wake_result.reason.expect("wake result implies a reason"),
            agent_state: state_snapshot,
            correlation_id: correlation_id.0,
            runtime_config: CognitionRuntimeConfig { enable_smart_retry },
        };

        let result = dispatcher.process(ctx).await;
        if let Some(text) = &result.response {
            info!(%text, confidence = result.confidence, used_smart_retry = result.used_smart_retry, "cognition produced a response");
        } else {
            info!(confidence = result.confidence, "cognition produced no user-visible response");
        }
        for intent in &result.intents {
            info!(kind = %intent.kind, payload = %intent.payload, "cognition intent");
            if intent.kind == "defer" {
                self.apply_defer_intent(intent, &trigger_signals, now);
            }
        }
    }

    /// Turns a `defer` terminal intent into acks on every signal that
    /// triggered this wake, so the ack registry's Rule 2 gating actually
    /// suppresses re-waking on them until the deferral lapses or the
    /// value moves past the override delta.
    fn apply_defer_intent(&mut self, intent: &agentcore_cognition::Intent, trigger_signals: &[Signal], now: DateTime<Utc>) {
        let reason = intent.payload.get("reason").and_then(|r| r.as_str()).unwrap_or("deferred by cognition").to_string();
        let defer_until = now + Duration::milliseconds(self.config.cognition.defer_duration_ms);
        for signal in trigger_signals {
            self.acks.record(Ack {
                signal_type: signal.signal_type.clone(),
                source: Some(signal.source),
                ack_type: AckType::Deferred,
                defer_until: Some(defer_until),
                value_at_ack: Some(signal.metrics.value),
                override_delta: None,
                reason: reason.clone(),
            });
        }
    }
}
