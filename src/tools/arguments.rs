//! Typed access to tool call arguments.

use serde_json::Value;

use crate::error::McpToolsError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: Value,
}

impl ToolArguments {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &Value {
        &self.value
    }

    pub fn into_inner(self) -> Value {
        self.value
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, McpToolsError> {
        self.get_str_opt(key)
            .ok_or_else(|| McpToolsError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Move the value stored under `from` to `to`. Returns whether a value moved.
    pub fn rename_key(&mut self, from: &str, to: &str) -> bool {
        let Some(object) = self.value.as_object_mut() else {
            return false;
        };
        match object.remove(from) {
            Some(moved) => {
                object.insert(to.to_owned(), moved);
                true
            }
            None => false,
        }
    }

    /// Deserialize the entire arguments into a typed struct.
    ///
    /// A string payload is parsed as JSON first; an empty string is `{}`.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, McpToolsError> {
        let value = match &self.value {
            Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str::<Value>(trimmed).map_err(|e| {
                        McpToolsError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
                    })?
                }
            }
            other => other.clone(),
        };
        serde_json::from_value(value).map_err(|e| {
            McpToolsError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
