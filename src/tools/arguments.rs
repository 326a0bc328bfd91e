//! Typed access to the arguments a model passed to a tool.

use serde_json::{Map, Value};

use crate::error::{ColloquyError, Result};

/// Decoded tool-call arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    value: Value,
}

impl ToolArguments {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Decode the raw argument text of a tool call. Blank text means no arguments.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::new(Value::Object(Map::new())));
        }
        serde_json::from_str(trimmed)
            .map(Self::new)
            .map_err(|e| ColloquyError::InvalidArgument(format!("arguments are not valid JSON: {e}")))
    }

    pub fn raw(&self) -> &Value {
        &self.value
    }

    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.value
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| missing("string", key))
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Result<i64> {
        self.value
            .get(key)
            .and_then(Value::as_i64)
            .ok_or_else(|| missing("integer", key))
    }

    pub fn get_f64(&self, key: &str) -> Result<f64> {
        self.value
            .get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| missing("number", key))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.value
            .get(key)
            .and_then(Value::as_bool)
            .ok_or_else(|| missing("boolean", key))
    }

    pub fn get_array(&self, key: &str) -> Result<&Vec<Value>> {
        self.value
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| missing("array", key))
    }

    /// Deserialize all arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.value.clone())
            .map_err(|e| ColloquyError::InvalidArgument(format!("failed to deserialize arguments: {e}")))
    }
}

fn missing(kind: &str, key: &str) -> ColloquyError {
    ColloquyError::InvalidArgument(format!("missing {kind} argument: {key}"))
}
