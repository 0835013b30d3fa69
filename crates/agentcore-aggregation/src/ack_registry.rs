//! Ack Registry (C8): unified suppress/defer/handle gating of signal
//! types, with override-by-delta for deferred acks.

use agentcore_core::Source;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AckType {
    Handled,
    Deferred,
    Suppressed,
}

#[derive(Clone, Debug)]
pub struct Ack {
    pub signal_type: String,
    pub source: Option<Source>,
    pub ack_type: AckType,
    pub defer_until: Option<DateTime<Utc>>,
    pub value_at_ack: Option<f64>,
    pub override_delta: Option<f64>,
    pub reason: String,
}

/// Default `overrideDelta` when an ack omits one. Pinned per the decision
/// in the consolidated wake config; tests assert this literal to guard
/// against accidental drift.
pub const DEFAULT_OVERRIDE_DELTA: f64 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AckDecision {
    /// No ack applies; evaluate the signal normally.
    NotBlocked,
    /// An ack suppresses/defers this signal; do not wake on it.
    Blocked,
    /// A deferred ack's value has moved past its override delta; treat as
    /// if unblocked.
    Overridden,
}

#[derive(Default)]
pub struct AckRegistry {
    acks: HashMap<(String, Option<Source>), Ack>,
}

impl AckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, ack: Ack) {
        let key = (ack.signal_type.clone(), ack.source);
        self.acks.insert(key, ack);
    }

    fn lookup(&self, signal_type: &str, source: Option<Source>) -> Option<&Ack> {
        self.acks
            .get(&(signal_type.to_string(), source))
            .or_else(|| self.acks.get(&(signal_type.to_string(), None)))
    }

    /// Evaluates whether a signal is currently blocked by an ack.
    /// Handled acks clear on first read (transient); suppressed acks
    /// persist; deferred acks are overridden once the current value has
    /// moved far enough from the value recorded at ack time.
    pub fn check(&mut self, signal_type: &str, source: Option<Source>, current_value: f64, now: DateTime<Utc>) -> AckDecision {
        let key = {
            let Some(ack) = self.lookup(signal_type, source) else {
                return AckDecision::NotBlocked;
            };
            (ack.signal_type.clone(), ack.source)
        };

        let Some(ack) = self.acks.get(&key).cloned() else {
            return AckDecision::NotBlocked;
        };

        let decision = match ack.ack_type {
            AckType::Suppressed => AckDecision::Blocked,
            AckType::Handled => AckDecision::Blocked,
            AckType::Deferred => {
                if let Some(defer_until) = ack.defer_until {
                    if now >= defer_until {
                        return AckDecision::NotBlocked;
                    }
                }
                let delta = ack.override_delta.unwrap_or(DEFAULT_OVERRIDE_DELTA);
                match ack.value_at_ack {
                    Some(value_at_ack) if (current_value - value_at_ack).abs() >= delta => AckDecision::Overridden,
                    _ => AckDecision::Blocked,
                }
            }
        };

        if ack.ack_type == AckType::Handled {
            self.acks.remove(&key);
        }

        decision
    }

    pub fn clear(&mut self, signal_type: &str, source: Option<Source>) -> bool {
        self.acks.remove(&(signal_type.to_string(), source)).is_some()
    }
}
