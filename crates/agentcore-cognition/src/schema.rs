//! Tool-call argument validation against each tool's declared JSON Schema.

use jsonschema::JSONSchema;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("arguments are not valid JSON: {0}")]
    InvalidJson(String),
    #[error("arguments failed schema validation: {0}")]
    SchemaViolation(String),
    #[error("tool declared an invalid input schema: {0}")]
    InvalidSchema(String),
}

pub fn parse_and_validate(raw_arguments: &str, schema: &Value) -> Result<Value, ValidationError> {
    let parsed: Value = serde_json::from_str(raw_arguments).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;
    validate(&parsed, schema)?;
    Ok(parsed)
}

pub fn validate(value: &Value, schema: &Value) -> Result<(), ValidationError> {
    let compiled = JSONSchema::compile(schema).map_err(|e| ValidationError::InvalidSchema(e.to_string()))?;
    let result = compiled.validate(value);
    if let Err(errors) = result {
        let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
        return Err(ValidationError::SchemaViolation(messages.join("; ")));
    }
    Ok(())
}
