//! The event shape external stimuli enter the queue as (§3 Event).

use crate::types::{Priority, Source};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct EventMeta {
    /// Set by `PriorityEventQueue::aggregate` on the surviving merged record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregated_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_occurrence: Option<DateTime<Utc>>,
    /// Overrides the event→signal mapping's default `expiresAt` derivation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at_override: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: uuid::Uuid,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub priority: Priority,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<EventMeta>,
}

impl Event {
    pub fn new(source: Source, event_type: impl Into<String>, priority: Priority, payload: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            source,
            channel: None,
            event_type: event_type.into(),
            priority,
            timestamp: Utc::now(),
            payload,
            meta: None,
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// The aggregation-merge key: events with an equal key within the
    /// aggregation window are candidates for merging.
    pub fn aggregation_key(&self) -> (Source, Option<String>, String) {
        (self.source, self.channel.clone(), self.event_type.clone())
    }

    pub fn is_user_message(&self) -> bool {
        self.event_type == "user_message" && matches!(self.source, Source::Communication)
    }
}
