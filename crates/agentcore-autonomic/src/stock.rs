//! Stock neurons shipped so the pipeline is exercisable without a plugin
//! already loaded (§4.5.1).

use crate::neuron::{Neuron, NamedThreshold, NeuronConfig, ScalarNeuron};
use agentcore_core::{CorrelationId, Priority, Signal, SignalData, SignalMetrics, Source};
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

pub const ALERTNESS_NEURON_ID: &str = "alertness";

/// Tracks `AgentState::alertness` directly with no change-detector gating:
/// alertness itself feeds every other neuron's `alertnessInfluence` term,
/// so it must always be current, not threshold-gated. Required at startup
/// by `validate_required_neurons`.
pub struct AlertnessNeuron {
    last_value: Mutex<Option<f64>>,
}

impl Default for AlertnessNeuron {
    fn default() -> Self {
        Self { last_value: Mutex::new(None) }
    }
}

impl Neuron for AlertnessNeuron {
    fn id(&self) -> &str {
        ALERTNESS_NEURON_ID
    }

    fn signal_type(&self) -> &str {
        "alertness"
    }

    fn source(&self) -> Source {
        Source::Internal
    }

    fn description(&self) -> &str {
        "Tracks agent alertness; always emits so downstream change-detector gating stays current."
    }

    fn check(&self, value: f64, _alertness: f64, now: DateTime<Utc>, correlation_id: CorrelationId) -> Option<Signal> {
        *self.last_value.lock().unwrap() = Some(value);
        Some(Signal {
            id: uuid::Uuid::new_v4(),
            signal_type: "alertness".to_string(),
            source: Source::Internal,
            timestamp: now,
            priority: Priority::Idle,
            metrics: SignalMetrics { value, rate_of_change: None, confidence: 1.0 },
            data: SignalData { kind: "alertness".to_string(), payload: serde_json::json!({ "value": value }), channel: None },
            correlation_id: Some(correlation_id),
            expires_at: now + Duration::seconds(60),
        })
    }

    fn reset(&self) {
        *self.last_value.lock().unwrap() = None;
    }

    fn get_last_value(&self) -> Option<f64> {
        *self.last_value.lock().unwrap()
    }
}

/// `contact_pressure` neuron: standard change-detector gating, named
/// "moderate"/"high" thresholds at fractions of the wake threshold.
pub fn contact_pressure_neuron(wake_threshold: f64) -> ScalarNeuron {
    ScalarNeuron::new(
        "contact_pressure",
        "contact_pressure",
        Source::Internal,
        "Tracks contact pressure build-up toward the wake threshold.",
        NeuronConfig {
            named_thresholds: [
                Some(NamedThreshold { level: "moderate", value: wake_threshold * 0.7, priority: Priority::Normal }),
                Some(NamedThreshold { level: "high", value: wake_threshold, priority: Priority::High }),
            ],
            ..NeuronConfig::default()
        },
    )
}

/// `social_debt` neuron: same shape as `contact_pressure_neuron`.
pub fn social_debt_neuron(wake_threshold: f64) -> ScalarNeuron {
    ScalarNeuron::new(
        "social_debt",
        "social_debt",
        Source::Internal,
        "Tracks accrued social debt toward the wake threshold.",
        NeuronConfig {
            named_thresholds: [
                Some(NamedThreshold { level: "moderate", value: wake_threshold * 0.7, priority: Priority::Normal }),
                Some(NamedThreshold { level: "high", value: wake_threshold, priority: Priority::High }),
            ],
            ..NeuronConfig::default()
        },
    )
}

struct RollingStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RollingStats {
    fn new() -> Self {
        Self { count: 0, mean: 0.0, m2: 0.0 }
    }

    /// Welford's online algorithm; returns the z-score of `value` against
    /// the stats observed *before* this sample is folded in.
    fn observe_and_score(&mut self, value: f64) -> f64 {
        let stddev = if self.count >= 2 {
            (self.m2 / (self.count as f64 - 1.0)).sqrt()
        } else {
            0.0
        };
        let z = if stddev > 0.0 { (value - self.mean) / stddev } else { 0.0 };

        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        z
    }
}

/// Tracks a rolling mean/variance of a named metric and emits when a new
/// sample's z-score exceeds a configured sensitivity — the source for the
/// `pattern_break` wake rule.
pub struct PatternBreakNeuron {
    metric_name: String,
    sensitivity: f64,
    min_interval_ms: i64,
    stats: Mutex<RollingStats>,
    last_emitted_at: Mutex<Option<DateTime<Utc>>>,
    last_value: Mutex<Option<f64>>,
}

impl PatternBreakNeuron {
    pub fn new(metric_name: impl Into<String>, sensitivity: f64, min_interval_ms: i64) -> Self {
        Self {
            metric_name: metric_name.into(),
            sensitivity,
            min_interval_ms,
            stats: Mutex::new(RollingStats::new()),
            last_emitted_at: Mutex::new(None),
            last_value: Mutex::new(None),
        }
    }
}

impl Neuron for PatternBreakNeuron {
    fn id(&self) -> &str {
        "pattern_break"
    }

    fn signal_type(&self) -> &str {
        "pattern_break"
    }

    fn source(&self) -> Source {
        Source::Internal
    }

    fn description(&self) -> &str {
        "Emits when a tracked metric's z-score exceeds the configured sensitivity."
    }

    fn check(&self, value: f64, _alertness: f64, now: DateTime<Utc>, correlation_id: CorrelationId) -> Option<Signal> {
        *self.last_value.lock().unwrap() = Some(value);
        let z = self.stats.lock().unwrap().observe_and_score(value);

        if z.abs() < self.sensitivity {
            return None;
        }

        let mut last_emitted = self.last_emitted_at.lock().unwrap();
        if let Some(at) = *last_emitted {
            if (now - at).num_milliseconds() < self.min_interval_ms {
                return None;
            }
        }
        *last_emitted = Some(now);

        Some(Signal {
            id: uuid::Uuid::new_v4(),
            signal_type: "pattern_break".to_string(),
            source: Source::Internal,
            timestamp: now,
            priority: Priority::High,
            metrics: SignalMetrics { value: z, rate_of_change: None, confidence: 1.0 },
            data: SignalData {
                kind: "pattern_break".to_string(),
                payload: serde_json::json!({ "metric": self.metric_name, "value": value, "z_score": z }),
                channel: None,
            },
            correlation_id: Some(correlation_id),
            expires_at: now + Duration::seconds(60),
        })
    }

    fn reset(&self) {
        *self.stats.lock().unwrap() = RollingStats::new();
        *self.last_emitted_at.lock().unwrap() = None;
        *self.last_value.lock().unwrap() = None;
    }

    fn get_last_value(&self) -> Option<f64> {
        *self.last_value.lock().unwrap()
    }
}
