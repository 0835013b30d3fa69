//! The signal shape flowing through the bus, autonomic layer, and
//! aggregation layer (§3 Signal).

use crate::types::{CorrelationId, Priority, Source};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct SignalMetrics {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_of_change: Option<f64>,
    pub confidence: f64,
}

/// Tagged payload carried alongside a signal's typed metrics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignalData {
    pub kind: String,
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Signal {
    pub id: uuid::Uuid,
    #[serde(rename = "type")]
    pub signal_type: String,
    pub source: Source,
    pub timestamp: DateTime<Utc>,
    pub priority: Priority,
    pub metrics: SignalMetrics,
    pub data: SignalData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    pub expires_at: DateTime<Utc>,
}

impl Signal {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// The aggregation key: `(type, source)` per §3's `SignalAggregate`.
    pub fn aggregate_key(&self) -> (String, Source) {
        (self.signal_type.clone(), self.source)
    }

    pub fn is_user_message(&self) -> bool {
        self.signal_type == "user_message" && matches!(self.source, Source::Communication)
    }
}

/// Running per-`(type, source)` summary (§3 SignalAggregate).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignalAggregate {
    pub current_value: f64,
    pub previous_value: f64,
    pub rate_of_change: f64,
    pub sample_count: u64,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl SignalAggregate {
    pub fn new(value: f64, at: DateTime<Utc>) -> Self {
        Self {
            current_value: value,
            previous_value: value,
            rate_of_change: 0.0,
            sample_count: 1,
            first_seen_at: at,
            last_seen_at: at,
        }
    }

    pub fn observe(&mut self, value: f64, at: DateTime<Utc>) {
        let dt_secs = (at - self.last_seen_at).num_milliseconds() as f64 / 1000.0;
        self.previous_value = self.current_value;
        self.rate_of_change = if dt_secs > 0.0 {
            (value - self.current_value) / dt_secs
        } else {
            0.0
        };
        self.current_value = value;
        self.sample_count += 1;
        self.last_seen_at = at;
    }
}
