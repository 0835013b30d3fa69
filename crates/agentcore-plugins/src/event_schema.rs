//! Plugin-extensible signal schema registry (§6 of the plugin contract):
//! plugins register a JSON Schema validator keyed by event kind so a
//! malformed `plugin_event` payload never reaches cognition.

use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid JSON schema for event kind {kind}: {source}")]
    InvalidSchema { kind: String, source: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub error: Option<String>,
}

struct RegisteredSchema {
    validator: jsonschema::Validator,
    plugin_id: Option<String>,
}

/// Keyed by `eventKind` (e.g. `"p1:reminder_due"`). An unregistered kind
/// has no validator and passes through unvalidated — only a registered,
/// failing schema rejects an event.
#[derive(Default)]
pub struct EventSchemaRegistry {
    schemas: HashMap<String, RegisteredSchema>,
}

impl EventSchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_event_schema(&mut self, kind: String, schema: Value, plugin_id: Option<String>) -> Result<(), SchemaError> {
        let validator = jsonschema::validator_for(&schema).map_err(|e| SchemaError::InvalidSchema { kind: kind.clone(), source: e.to_string() })?;
        self.schemas.insert(kind, RegisteredSchema { validator, plugin_id });
        Ok(())
    }

    pub fn validate_plugin_event(&self, kind: &str, data: &Value) -> ValidationOutcome {
        let Some(registered) = self.schemas.get(kind) else {
            return ValidationOutcome { valid: true, error: None };
        };
        match registered.validator.validate(data) {
            Ok(()) => ValidationOutcome { valid: true, error: None },
            Err(e) => ValidationOutcome { valid: false, error: Some(e.to_string()) },
        }
    }

    /// Called on unload/hot-swap-deactivate so a departed plugin's
    /// validators don't linger and silently stop gating anything.
    pub fn unregister_plugin(&mut self, plugin_id: &str) {
        self.schemas.retain(|_, s| s.plugin_id.as_deref() != Some(plugin_id));
    }
}
