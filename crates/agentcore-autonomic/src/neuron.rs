//! Neuron trait and registry (C5) — periodic checkers that emit a signal
//! on a Weber–Fechner-significant change, gated by refractory period.

use agentcore_core::{CorrelationId, Priority, Signal, SignalData, SignalMetrics, Source};
use agentcore_queue::{detect_change, ChangeDetectorConfig};
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Named threshold crossing, checked independently of change magnitude
/// (§4.5 point 4).
#[derive(Clone, Copy, Debug)]
pub struct NamedThreshold {
    pub level: &'static str,
    pub value: f64,
    pub priority: Priority,
}

pub trait Neuron: Send + Sync {
    fn id(&self) -> &str;
    fn signal_type(&self) -> &str;
    fn source(&self) -> Source;
    fn description(&self) -> &str;

    /// Returns a signal when the observed value has changed significantly
    /// or crossed a named threshold; `None` otherwise.
    fn check(&self, value: f64, alertness: f64, now: DateTime<Utc>, correlation_id: CorrelationId) -> Option<Signal>;

    fn reset(&self);
    fn get_last_value(&self) -> Option<f64>;
}

#[derive(Clone, Copy, Debug)]
pub struct NeuronConfig {
    pub min_interval_ms: i64,
    pub always_emit_threshold: f64,
    pub change_detector: ChangeDetectorConfig,
    pub named_thresholds: [Option<NamedThreshold>; 2],
}

impl Default for NeuronConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 1000,
            always_emit_threshold: f64::INFINITY,
            change_detector: ChangeDetectorConfig::default(),
            named_thresholds: [None, None],
        }
    }
}

struct NeuronState {
    previous_value: Option<f64>,
    last_emitted_at: Option<DateTime<Utc>>,
}

/// Generic scalar-watching neuron: the reference implementation every
/// stock neuron configures rather than reimplements.
pub struct ScalarNeuron {
    id: String,
    signal_type: String,
    source: Source,
    description: String,
    config: NeuronConfig,
    state: Mutex<NeuronState>,
}

impl ScalarNeuron {
    pub fn new(
        id: impl Into<String>,
        signal_type: impl Into<String>,
        source: Source,
        description: impl Into<String>,
        config: NeuronConfig,
    ) -> Self {
        Self {
            id: id.into(),
            signal_type: signal_type.into(),
            source,
            description: description.into(),
            config,
            state: Mutex::new(NeuronState { previous_value: None, last_emitted_at: None }),
        }
    }

    fn crossed_threshold(&self, previous: f64, current: f64) -> Option<NamedThreshold> {
        self.config
            .named_thresholds
            .iter()
            .flatten()
            .find(|t| previous < t.value && current >= t.value)
            .copied()
    }

    fn build_signal(&self, value: f64, priority: Priority, now: DateTime<Utc>, correlation_id: CorrelationId) -> Signal {
        Signal {
            id: uuid::Uuid::new_v4(),
            signal_type: self.signal_type.clone(),
            source: self.source,
            timestamp: now,
            priority,
            metrics: SignalMetrics { value, rate_of_change: None, confidence: 1.0 },
            data: SignalData { kind: self.signal_type.clone(), payload: serde_json::json!({ "value": value }), channel: None },
            correlation_id: Some(correlation_id),
            expires_at: now + Duration::seconds(60),
        }
    }
}

impl Neuron for ScalarNeuron {
    fn id(&self) -> &str {
        &self.id
    }

    fn signal_type(&self) -> &str {
        &self.signal_type
    }

    fn source(&self) -> Source {
        self.source
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn check(&self, value: f64, alertness: f64, now: DateTime<Utc>, correlation_id: CorrelationId) -> Option<Signal> {
        let mut state = self.state.lock().unwrap();

        let Some(previous) = state.previous_value else {
            state.previous_value = Some(value);
            if value >= self.config.always_emit_threshold {
                state.last_emitted_at = Some(now);
                return Some(self.build_signal(value, Priority::Normal, now, correlation_id));
            }
            return None;
        };

        if let Some(last_emitted) = state.last_emitted_at {
            if (now - last_emitted).num_milliseconds() < self.config.min_interval_ms {
                return None;
            }
        }

        let threshold_crossed = self.crossed_threshold(previous, value);
        let change = detect_change(previous, value, alertness, &self.config.change_detector);

        if change.is_significant || threshold_crossed.is_some() {
            state.previous_value = Some(value);
            state.last_emitted_at = Some(now);
            let priority = threshold_crossed.map(|t| t.priority).unwrap_or(Priority::Low);
            return Some(self.build_signal(value, priority, now, correlation_id));
        }

        state.previous_value = Some(value);
        None
    }

    fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.previous_value = None;
        state.last_emitted_at = None;
    }

    fn get_last_value(&self) -> Option<f64> {
        self.state.lock().unwrap().previous_value
    }
}
