//! Signal Filter Pipeline (C6): an ordered list of stateless transforms
//! applied to incoming signals before they reach the neuron pass.

use agentcore_core::{Priority, Signal, Source};
use chrono::{DateTime, Utc};

pub struct FilterContext {
    pub now: DateTime<Utc>,
}

pub trait SignalFilterStage: Send + Sync {
    fn id(&self) -> &str;
    /// Which signal types this stage inspects; empty means "all".
    fn handles(&self) -> &[&str] {
        &[]
    }
    /// Lower runs first.
    fn priority(&self) -> i32 {
        0
    }
    fn process(&self, signals: Vec<Signal>, ctx: &FilterContext) -> Vec<Signal>;
}

#[derive(Default)]
pub struct FilterRegistry {
    stages: Vec<Box<dyn SignalFilterStage>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, stage: Box<dyn SignalFilterStage>) {
        self.stages.push(stage);
        self.stages.sort_by_key(|s| s.priority());
    }

    pub fn process(&self, mut signals: Vec<Signal>, ctx: &FilterContext) -> Vec<Signal> {
        for stage in &self.stages {
            signals = stage.process(signals, ctx);
        }
        signals
    }
}

/// Bumps a signal's priority to `HIGH` if its source is `communication`
/// and its type is `user_message`; no-op otherwise.
pub struct PriorityEscalationFilter;

impl SignalFilterStage for PriorityEscalationFilter {
    fn id(&self) -> &str {
        "priority_escalation"
    }

    fn process(&self, mut signals: Vec<Signal>, _ctx: &FilterContext) -> Vec<Signal> {
        for signal in &mut signals {
            if signal.source == Source::Communication && signal.signal_type == "user_message" {
                signal.priority = Priority::High;
            }
        }
        signals
    }
}

/// Drops any signal whose `expiresAt` has already passed before it
/// reaches aggregation.
pub struct ExpiryFilter;

impl SignalFilterStage for ExpiryFilter {
    fn id(&self) -> &str {
        "expiry"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn process(&self, signals: Vec<Signal>, ctx: &FilterContext) -> Vec<Signal> {
        signals.into_iter().filter(|s| !s.is_expired(ctx.now)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore_core::{SignalData, SignalMetrics};
    use serde_json::Value;

    fn sample(signal_type: &str, source: Source, expires_at: DateTime<Utc>) -> Signal {
        Signal {
            id: uuid::Uuid::new_v4(),
            signal_type: signal_type.to_string(),
            source,
            timestamp: Utc::now(),
            priority: Priority::Normal,
            metrics: SignalMetrics { value: 1.0, rate_of_change: None, confidence: 1.0 },
            data: SignalData { kind: signal_type.to_string(), payload: Value::Null, channel: None },
            correlation_id: None,
            expires_at,
        }
    }

    #[test]
    fn priority_escalation_bumps_user_message_only() {
        let now = Utc::now();
        let mut signals = vec![
            sample("user_message", Source::Communication, now + chrono::Duration::seconds(60)),
            sample("user_message", Source::Plugin, now + chrono::Duration::seconds(60)),
        ];
        signals = PriorityEscalationFilter.process(signals, &FilterContext { now });
        assert_eq!(signals[0].priority, Priority::High);
        assert_eq!(signals[1].priority, Priority::Normal);
    }

    #[test]
    fn expiry_filter_drops_expired_signals() {
        let now = Utc::now();
        let signals = vec![
            sample("x", Source::Internal, now - chrono::Duration::seconds(1)),
            sample("y", Source::Internal, now + chrono::Duration::seconds(60)),
        ];
        let result = ExpiryFilter.process(signals, &FilterContext { now });
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].signal_type, "y");
    }

    #[test]
    fn registry_runs_stages_in_priority_order() {
        let mut registry = FilterRegistry::new();
        registry.register(Box::new(ExpiryFilter));
        registry.register(Box::new(PriorityEscalationFilter));
        let now = Utc::now();
        let signals = vec![sample("user_message", Source::Communication, now + chrono::Duration::seconds(60))];
        let result = registry.process(signals, &FilterContext { now });
        assert_eq!(result[0].priority, Priority::High);
    }
}
