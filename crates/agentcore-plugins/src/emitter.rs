//! Rate-limited signal emitter (§4.4.5): one per loaded plugin, gating
//! how often a plugin may push `plugin_event` signals into the pipeline.

use agentcore_core::{Priority, Signal, SignalData, SignalMetrics, Source};
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

const DEFAULT_WARNING_THRESHOLD: u32 = 120;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EmitError {
    #[error("event kind must start with \"{plugin_id}:\"")]
    KindPrefixMismatch { plugin_id: String },
    #[error("rate limit exceeded: {count} emits this minute (limit {limit})")]
    RateLimited { count: u32, limit: u32 },
}

pub struct SignalEmitter {
    plugin_id: String,
    rate_limit: Option<u32>,
    emit_count: u32,
    minute_start: DateTime<Utc>,
    warning_logged: bool,
}

impl SignalEmitter {
    pub fn new(plugin_id: &str, rate_limit: Option<u32>, now: DateTime<Utc>) -> Self {
        Self { plugin_id: plugin_id.to_string(), rate_limit, emit_count: 0, minute_start: now, warning_logged: false }
    }

    fn warning_threshold(&self) -> u32 {
        self.rate_limit.unwrap_or(DEFAULT_WARNING_THRESHOLD)
    }

    pub fn emit(&mut self, kind: &str, payload: serde_json::Value, now: DateTime<Utc>) -> Result<Signal, EmitError> {
        let prefix = format!("{}:", self.plugin_id);
        if !kind.starts_with(&prefix) {
            return Err(EmitError::KindPrefixMismatch { plugin_id: self.plugin_id.clone() });
        }

        if (now - self.minute_start).num_seconds() > 60 {
            self.minute_start = now;
            self.emit_count = 0;
            self.warning_logged = false;
        }
        self.emit_count += 1;

        if self.emit_count > self.warning_threshold() && !self.warning_logged {
            self.warning_logged = true;
            warn!(plugin_id = %self.plugin_id, count = self.emit_count, "plugin signal emit rate approaching/exceeding threshold");
        }

        if let Some(limit) = self.rate_limit {
            if self.emit_count > limit {
                return Err(EmitError::RateLimited { count: self.emit_count, limit });
            }
        }

        Ok(Signal {
            id: Uuid::new_v4(),
            signal_type: "plugin_event".to_string(),
            source: Source::Plugin,
            timestamp: now,
            priority: Priority::Normal,
            metrics: SignalMetrics { value: 1.0, rate_of_change: None, confidence: 1.0 },
            data: SignalData { kind: kind.to_string(), payload, channel: None },
            correlation_id: None,
            expires_at: now + chrono::Duration::seconds(60),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_kind_without_plugin_prefix() {
        let mut emitter = SignalEmitter::new("p1", None, Utc::now());
        let result = emitter.emit("other:event", serde_json::json!({}), Utc::now());
        assert_eq!(result.unwrap_err(), EmitError::KindPrefixMismatch { plugin_id: "p1".into() });
    }

    #[test]
    fn accepts_correctly_prefixed_kind() {
        let mut emitter = SignalEmitter::new("p1", None, Utc::now());
        let signal = emitter.emit("p1:tick", serde_json::json!({}), Utc::now()).unwrap();
        assert_eq!(signal.signal_type, "plugin_event");
    }

    #[test]
    fn rejects_past_rate_limit() {
        let mut emitter = SignalEmitter::new("p1", Some(2), Utc::now());
        let now = Utc::now();
        emitter.emit("p1:a", serde_json::json!({}), now).unwrap();
        emitter.emit("p1:a", serde_json::json!({}), now).unwrap();
        assert!(emitter.emit("p1:a", serde_json::json!({}), now).is_err());
    }

    #[test]
    fn counters_reset_after_a_minute() {
        let mut emitter = SignalEmitter::new("p1", Some(1), Utc::now());
        let t0 = Utc::now();
        emitter.emit("p1:a", serde_json::json!({}), t0).unwrap();
        assert!(emitter.emit("p1:a", serde_json::json!({}), t0).is_err());
        let later = t0 + chrono::Duration::seconds(61);
        assert!(emitter.emit("p1:a", serde_json::json!({}), later).is_ok());
    }
}
