//! Storage primitive (C10): a per-plugin namespaced key-value store with
//! size accounting and pagination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const QUERY_LIMIT_CAP: usize = 1000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredValue {
    pub value: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderBy {
    Key,
    CreatedAt,
}

#[derive(Default)]
pub struct QueryOptions {
    pub prefix: Option<String>,
    pub filter: Option<Box<dyn Fn(&str, &Value) -> bool + Send + Sync>>,
    pub order_by: Option<OrderBy>,
    pub offset: usize,
    pub limit: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage size limit exceeded: {used_mb:.3}MB + delta would exceed maxSizeMB={max_mb:.3}")]
    SizeLimitExceeded { used_mb: f64, max_mb: f64 },
}

/// Rough size estimate: JSON-serialized byte length. Cheap and stable
/// enough for warning/limit accounting without a dedicated sizing crate.
fn approx_size(value: &Value) -> usize {
    serde_json::to_vec(value).map(|bytes| bytes.len()).unwrap_or(0)
}

pub struct PluginStorage {
    namespace: String,
    data: BTreeMap<String, StoredValue>,
    size_bytes: usize,
    warning_size_mb: f64,
    max_size_mb: f64,
    warned: bool,
}

impl PluginStorage {
    pub fn new(plugin_id: &str, warning_size_mb: f64, max_size_mb: f64) -> Self {
        Self {
            namespace: format!("plugin:{plugin_id}:"),
            data: BTreeMap::new(),
            size_bytes: 0,
            warning_size_mb,
            max_size_mb,
            warned: false,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key).map(|v| &v.value)
    }

    pub fn set(&mut self, key: &str, value: Value, now: DateTime<Utc>) -> Result<(), StorageError> {
        let old_size = self.data.get(key).map(|v| approx_size(&v.value)).unwrap_or(0);
        let new_size = approx_size(&value);
        let delta = new_size as isize - old_size as isize;

        if delta > 0 {
            let projected_mb = (self.size_bytes as isize + delta) as f64 / (1024.0 * 1024.0);
            if projected_mb > self.max_size_mb {
                return Err(StorageError::SizeLimitExceeded { used_mb: projected_mb, max_mb: self.max_size_mb });
            }
            if projected_mb > self.warning_size_mb && !self.warned {
                self.warned = true;
                tracing::warn!(namespace = %self.namespace, used_mb = projected_mb, "plugin storage approaching size limit");
            }
        }

        self.size_bytes = (self.size_bytes as isize + delta).max(0) as usize;
        self.data.insert(key.to_string(), StoredValue { value, created_at: now });
        Ok(())
    }

    pub fn delete(&mut self, key: &str) -> bool {
        match self.data.remove(key) {
            Some(old) => {
                self.size_bytes = self.size_bytes.saturating_sub(approx_size(&old.value));
                true
            }
            None => false,
        }
    }

    pub fn keys(&self, pattern: Option<&str>) -> Vec<String> {
        self.data
            .keys()
            .filter(|k| pattern.map(|p| k.starts_with(p)).unwrap_or(true))
            .cloned()
            .collect()
    }

    pub fn query(&self, opts: QueryOptions) -> Vec<(String, Value)> {
        let mut entries: Vec<(&String, &StoredValue)> = self
            .data
            .iter()
            .filter(|(k, _)| opts.prefix.as_deref().map(|p| k.starts_with(p)).unwrap_or(true))
            .filter(|(k, v)| opts.filter.as_ref().map(|f| f(k, &v.value)).unwrap_or(true))
            .collect();

        match opts.order_by {
            Some(OrderBy::CreatedAt) => entries.sort_by_key(|(_, v)| v.created_at),
            Some(OrderBy::Key) | None => entries.sort_by_key(|(k, _)| k.clone()),
        }

        let limit = opts.limit.unwrap_or(QUERY_LIMIT_CAP).min(QUERY_LIMIT_CAP);
        entries.into_iter().skip(opts.offset).take(limit).map(|(k, v)| (k.clone(), v.value.clone())).collect()
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.size_bytes = 0;
        self.warned = false;
    }

    pub fn get_all_data(&self) -> Vec<(String, StoredValue)> {
        self.data.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn restore_data(&mut self, entries: Vec<(String, StoredValue)>) {
        self.clear();
        for (key, stored) in entries {
            self.size_bytes += approx_size(&stored.value);
            self.data.insert(key, stored);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> PluginStorage {
        PluginStorage::new("example", 1.0, 2.0)
    }

    #[test]
    fn namespace_is_prefixed() {
        assert_eq!(storage().namespace(), "plugin:example:");
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut s = storage();
        s.set("k", serde_json::json!({"a":1}), Utc::now()).unwrap();
        assert_eq!(s.get("k"), Some(&serde_json::json!({"a":1})));
    }

    #[test]
    fn delete_removes_and_shrinks() {
        let mut s = storage();
        s.set("k", serde_json::json!("value"), Utc::now()).unwrap();
        assert!(s.delete("k"));
        assert!(s.get("k").is_none());
        assert_eq!(s.size_bytes, 0);
    }

    #[test]
    fn set_rejects_growth_past_max_size() {
        let mut s = PluginStorage::new("example", 0.0001, 0.0002);
        let big = Value::String("x".repeat(1024));
        assert!(s.set("k1", big.clone(), Utc::now()).is_ok());
        let result = s.set("k2", big, Utc::now());
        assert!(result.is_err());
    }

    #[test]
    fn query_respects_limit_cap() {
        let mut s = storage();
        for i in 0..5 {
            s.set(&format!("k{i}"), serde_json::json!(i), Utc::now()).unwrap();
        }
        let results = s.query(QueryOptions { limit: Some(2), ..Default::default() });
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn query_filters_by_prefix() {
        let mut s = storage();
        s.set("user:1", serde_json::json!(1), Utc::now()).unwrap();
        s.set("system:1", serde_json::json!(1), Utc::now()).unwrap();
        let results = s.query(QueryOptions { prefix: Some("user:".into()), ..Default::default() });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "user:1");
    }

    #[test]
    fn restore_data_replaces_contents() {
        let mut s = storage();
        s.set("old", serde_json::json!(1), Utc::now()).unwrap();
        let backup = vec![("new".to_string(), StoredValue { value: serde_json::json!(2), created_at: Utc::now() })];
        s.restore_data(backup);
        assert!(s.get("old").is_none());
        assert_eq!(s.get("new"), Some(&serde_json::json!(2)));
    }
}
