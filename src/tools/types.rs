//! Tool parameter schemas.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON Schema-based parameter definition for a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentToolParameters {
    /// JSON Schema object describing the parameters.
    pub schema: Value,
}

impl AgentToolParameters {
    /// Create from a raw JSON Schema value.
    pub fn from_schema(schema: Value) -> Self {
        Self { schema }
    }

    /// Create an empty parameter schema (no parameters).
    pub fn empty() -> Self {
        Self {
            schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": [],
            }),
        }
    }

    /// Declared properties, if the schema has any.
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.schema.get("properties").and_then(Value::as_object)
    }

    pub fn required(&self) -> Vec<&str> {
        self.schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required().contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_properties_and_required_names() {
        let params = AgentToolParameters::from_schema(json!({
            "type": "object",
            "properties": { "q": { "type": "string" }, "limit": { "type": "integer" } },
            "required": ["q"]
        }));
        assert_eq!(params.properties().map(Map::len), Some(2));
        assert!(params.is_required("q"));
        assert!(!params.is_required("limit"));
    }

    #[test]
    fn empty_schema_has_no_properties() {
        let params = AgentToolParameters::empty();
        assert_eq!(params.properties().map(Map::len), Some(0));
        assert!(params.required().is_empty());
        assert!(AgentToolParameters::from_schema(json!({})).properties().is_none());
    }
}
