//! Recipient Registry (C2): bidirectional stable mapping between an
//! opaque recipient id and `(channel, destination)`.

use crate::error::{RecipientError, Result};
use crate::record::{derive_recipient_id, has_valid_prefix, RecipientRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Default)]
pub struct RecipientRegistry {
    by_id: HashMap<String, RecipientRecord>,
    by_route: HashMap<(String, String), String>,
}

impl RecipientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing id for `(channel, destination)`, or mints and
    /// registers a new one. Fails loud if the derived id is already
    /// registered to a *different* route (a hash collision, vanishingly
    /// unlikely but never silently overwritten).
    pub fn get_or_create(&mut self, channel: &str, destination: &str, now: DateTime<Utc>) -> Result<String> {
        let route_key = (channel.to_string(), destination.to_string());
        if let Some(id) = self.by_route.get(&route_key) {
            return Ok(id.clone());
        }

        let id = derive_recipient_id(channel, destination);
        if let Some(existing) = self.by_id.get(&id) {
            if existing.channel != channel || existing.destination != destination {
                return Err(RecipientError::IdCollision { id });
            }
        }

        self.by_id.insert(
            id.clone(),
            RecipientRecord {
                recipient_id: id.clone(),
                channel: channel.to_string(),
                destination: destination.to_string(),
                registered_at: now,
                last_seen_at: now,
            },
        );
        self.by_route.insert(route_key, id.clone());
        Ok(id)
    }

    pub fn resolve(&self, id: &str) -> Option<(&str, &str)> {
        self.by_id.get(id).map(|r| (r.channel.as_str(), r.destination.as_str()))
    }

    pub fn lookup(&self, channel: &str, destination: &str) -> Option<&str> {
        self.by_route.get(&(channel.to_string(), destination.to_string())).map(|s| s.as_str())
    }

    pub fn get_record(&self, id: &str) -> Option<&RecipientRecord> {
        self.by_id.get(id)
    }

    pub fn touch(&mut self, id: &str, now: DateTime<Utc>) -> Result<()> {
        let record = self.by_id.get_mut(id).ok_or_else(|| RecipientError::NotFound(id.to_string()))?;
        record.last_seen_at = now;
        Ok(())
    }

    pub fn get_all(&self) -> Vec<&RecipientRecord> {
        self.by_id.values().collect()
    }

    pub fn remove(&mut self, id: &str) -> Option<RecipientRecord> {
        let record = self.by_id.remove(id)?;
        self.by_route.remove(&(record.channel.clone(), record.destination.clone()));
        Some(record)
    }

    pub fn export(&self) -> Vec<RecipientRecord> {
        let mut records: Vec<_> = self.by_id.values().cloned().collect();
        records.sort_by(|a, b| a.recipient_id.cmp(&b.recipient_id));
        records
    }

    /// Replaces all state with `records`, validating as it goes. Rejects
    /// the whole import (leaving the registry untouched) on the first
    /// malformed id, duplicate id, or duplicate route.
    pub fn import(&mut self, records: Vec<RecipientRecord>) -> Result<()> {
        let mut by_id = HashMap::new();
        let mut by_route = HashMap::new();

        for record in records {
            if !has_valid_prefix(&record.recipient_id) {
                return Err(RecipientError::MalformedId(record.recipient_id));
            }
            if by_id.contains_key(&record.recipient_id) {
                return Err(RecipientError::DuplicateId(record.recipient_id));
            }
            let route_key = (record.channel.clone(), record.destination.clone());
            if by_route.contains_key(&route_key) {
                return Err(RecipientError::DuplicateRoute { channel: record.channel, destination: record.destination });
            }
            by_route.insert(route_key, record.recipient_id.clone());
            by_id.insert(record.recipient_id.clone(), record);
        }

        self.by_id = by_id;
        self.by_route = by_route;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent_per_route() {
        let mut registry = RecipientRegistry::new();
        let now = Utc::now();
        let a = registry.get_or_create("sms", "+1555", now).unwrap();
        let b = registry.get_or_create("sms", "+1555", now).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_routes_never_collide_via_nul_separator() {
        let mut registry = RecipientRegistry::new();
        let now = Utc::now();
        let a = registry.get_or_create("a\0b", "c", now).unwrap();
        let b = registry.get_or_create("a", "b\0c", now).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_and_lookup_are_inverse() {
        let mut registry = RecipientRegistry::new();
        let now = Utc::now();
        let id = registry.get_or_create("sms", "+1555", now).unwrap();
        assert_eq!(registry.resolve(&id), Some(("sms", "+1555")));
        assert_eq!(registry.lookup("sms", "+1555"), Some(id.as_str()));
    }

    #[test]
    fn remove_clears_both_indexes() {
        let mut registry = RecipientRegistry::new();
        let now = Utc::now();
        let id = registry.get_or_create("sms", "+1555", now).unwrap();
        registry.remove(&id);
        assert!(registry.resolve(&id).is_none());
        assert!(registry.lookup("sms", "+1555").is_none());
    }

    #[test]
    fn import_rejects_malformed_id() {
        let mut registry = RecipientRegistry::new();
        let bad = RecipientRecord {
            recipient_id: "not-rcpt".into(),
            channel: "sms".into(),
            destination: "+1555".into(),
            registered_at: Utc::now(),
            last_seen_at: Utc::now(),
        };
        assert!(registry.import(vec![bad]).is_err());
    }

    #[test]
    fn import_rejects_duplicate_route() {
        let mut registry = RecipientRegistry::new();
        let now = Utc::now();
        let r1 = RecipientRecord {
            recipient_id: derive_recipient_id("sms", "+1555"),
            channel: "sms".into(),
            destination: "+1555".into(),
            registered_at: now,
            last_seen_at: now,
        };
        let mut r2 = r1.clone();
        r2.recipient_id = derive_recipient_id("sms", "+1556");
        assert!(registry.import(vec![r1, r2]).is_err());
    }

    #[test]
    fn export_then_import_round_trips() {
        let mut registry = RecipientRegistry::new();
        let now = Utc::now();
        registry.get_or_create("sms", "+1555", now).unwrap();
        registry.get_or_create("email", "a@b.com", now).unwrap();
        let exported = registry.export();

        let mut restored = RecipientRegistry::new();
        restored.import(exported.clone()).unwrap();
        assert_eq!(restored.export(), exported);
    }
}
