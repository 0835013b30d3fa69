//! Aggregation Layer (C7): maintains per-(type, source) aggregates and
//! decides whether to wake cognition.

use crate::ack_registry::{AckDecision, AckRegistry};
use crate::config::WakeConfig;
use agentcore_core::{AgentState, Signal, SignalAggregate, Source};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WakeReason {
    UserMessage,
    ThresholdCrossed(String),
    PatternBreak,
    ScheduledPlugin,
}

pub struct WakeResult {
    pub wake: bool,
    pub reason: Option<WakeReason>,
    pub aggregates: HashMap<(String, Source), SignalAggregate>,
    pub trigger_signals: Vec<Signal>,
}

#[derive(Default)]
pub struct AggregationLayer {
    aggregates: HashMap<(String, Source), SignalAggregate>,
}

impl AggregationLayer {
    pub fn new() -> Self {
        Self::default()
    }

    fn update_aggregate(&mut self, signal: &Signal, now: DateTime<Utc>) {
        let key = signal.aggregate_key();
        match self.aggregates.get_mut(&key) {
            Some(agg) => agg.observe(signal.metrics.value, signal.timestamp),
            None => {
                self.aggregates.insert(key, SignalAggregate::new(signal.metrics.value, signal.timestamp));
            }
        }
        let _ = now;
    }

    fn prune_expired(&mut self, signals: &[Signal], now: DateTime<Utc>) {
        // Aggregates don't carry their own expiry; we drop the entry once
        // every signal contributing to it has expired, approximated here
        // by dropping aggregates whose source signals (if any remain in
        // this tick's batch) have all expired.
        let active_keys: std::collections::HashSet<_> = signals
            .iter()
            .filter(|s| !s.is_expired(now))
            .map(|s| s.aggregate_key())
            .collect();
        self.aggregates.retain(|key, _| active_keys.contains(key) || !signals.iter().any(|s| &s.aggregate_key() == key));
    }

    /// Runs the wake rules in order; first match wins.
    pub fn process(
        &mut self,
        signals: Vec<Signal>,
        state: &AgentState,
        ack_registry: &mut AckRegistry,
        wake_config: &WakeConfig,
        now: DateTime<Utc>,
    ) -> WakeResult {
        for signal in &signals {
            if !signal.is_expired(now) {
                self.update_aggregate(signal, now);
            }
        }
        self.prune_expired(&signals, now);

        let low_energy = state.energy < wake_config.low_energy_level;
        let multiplier = if low_energy { wake_config.low_energy_multiplier } else { 1.0 };

        // Rule 1: any user_message always wakes.
        if let Some(trigger) = signals.iter().find(|s| s.is_user_message()) {
            return WakeResult {
                wake: true,
                reason: Some(WakeReason::UserMessage),
                aggregates: self.aggregates.clone(),
                trigger_signals: vec![trigger.clone()],
            };
        }

        // Rule 2: ack-gated signals are suppressed unless overridden.
        let mut blocked_types: std::collections::HashSet<(String, Option<Source>)> = Default::default();
        for signal in &signals {
            let decision = ack_registry.check(&signal.signal_type, Some(signal.source), signal.metrics.value, now);
            if decision == AckDecision::Blocked {
                blocked_types.insert((signal.signal_type.clone(), Some(signal.source)));
            }
        }
        let is_blocked = |s: &Signal| blocked_types.contains(&(s.signal_type.clone(), Some(s.source)));

        // Rule 3: contact_pressure.
        if let Some(trigger) = signals
            .iter()
            .find(|s| s.signal_type == "contact_pressure" && s.metrics.value >= wake_config.contact_pressure_threshold * multiplier && !is_blocked(s))
        {
            return WakeResult {
                wake: true,
                reason: Some(WakeReason::ThresholdCrossed("contact_pressure".into())),
                aggregates: self.aggregates.clone(),
                trigger_signals: vec![trigger.clone()],
            };
        }

        // Rule 4: social_debt.
        if let Some(trigger) = signals
            .iter()
            .find(|s| s.signal_type == "social_debt" && s.metrics.value >= wake_config.social_debt_threshold * multiplier && !is_blocked(s))
        {
            return WakeResult {
                wake: true,
                reason: Some(WakeReason::ThresholdCrossed("social_debt".into())),
                aggregates: self.aggregates.clone(),
                trigger_signals: vec![trigger.clone()],
            };
        }

        // Rule 5: pattern_break signals have already cleared their
        // sensitivity bar at the neuron level; any surviving one wakes.
        if let Some(trigger) = signals.iter().find(|s| s.signal_type == "pattern_break" && !is_blocked(s)) {
            return WakeResult {
                wake: true,
                reason: Some(WakeReason::PatternBreak),
                aggregates: self.aggregates.clone(),
                trigger_signals: vec![trigger.clone()],
            };
        }

        // Rule 6: scheduled plugin-event signals always wake.
        if let Some(trigger) = signals.iter().find(|s| s.signal_type == "plugin_event") {
            return WakeResult {
                wake: true,
                reason: Some(WakeReason::ScheduledPlugin),
                aggregates: self.aggregates.clone(),
                trigger_signals: vec![trigger.clone()],
            };
        }

        WakeResult { wake: false, reason: None, aggregates: self.aggregates.clone(), trigger_signals: vec![] }
    }
}
