//! Validate tool call arguments against a tool's input schema before any frame is sent.

use serde_json::Value;

/// Validate tool arguments against a JSON Schema.
///
/// Checks the schema type, required field presence, property types and
/// `enum` membership. Nested object properties are validated recursively and
/// array items are checked against `items` when it is a single schema.
/// Returns `Err(message)` describing the first violation found.
pub fn validate_arguments(args: &Value, schema: &Value) -> Result<(), String> {
    validate_at(args, schema, None)
}

fn validate_at(value: &Value, schema: &Value, path: Option<&str>) -> Result<(), String> {
    if let Some(schema_type) = schema.get("type").and_then(Value::as_str) {
        if schema_type == "object" && !value.is_object() {
            return Err(match path {
                Some(path) => format!(
                    "field '{path}' expected type 'object', got {}",
                    json_type_name(value)
                ),
                None => format!("expected object arguments, got {}", json_type_name(value)),
            });
        }
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            return Err(format!(
                "field '{}' must be one of {}",
                path.unwrap_or("<root>"),
                Value::Array(allowed.clone())
            ));
        }
    }

    if let Some(obj) = value.as_object() {
        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for name in required.iter().filter_map(Value::as_str) {
                if !obj.contains_key(name) {
                    return Err(format!("missing required field '{}'", join(path, name)));
                }
            }
        }

        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (key, field) in obj {
                let Some(prop_schema) = properties.get(key) else {
                    continue;
                };
                let field_path = join(path, key);
                check_type(field, prop_schema, &field_path)?;
                validate_at(field, prop_schema, Some(&field_path))?;
            }
        }
    }

    if let (Some(items), Some(elements)) = (
        schema.get("items").filter(|items| items.is_object()),
        value.as_array(),
    ) {
        for (index, element) in elements.iter().enumerate() {
            let element_path = format!("{}[{index}]", path.unwrap_or(""));
            check_type(element, items, &element_path)?;
            validate_at(element, items, Some(&element_path))?;
        }
    }

    Ok(())
}

fn check_type(value: &Value, schema: &Value, path: &str) -> Result<(), String> {
    let matches = match schema.get("type") {
        Some(Value::String(expected)) => value_matches_type(value, expected),
        Some(Value::Array(options)) => options
            .iter()
            .filter_map(Value::as_str)
            .any(|expected| value_matches_type(value, expected)),
        _ => true,
    };
    if matches {
        return Ok(());
    }
    Err(format!(
        "field '{path}' expected type '{}', got {}",
        type_label(schema),
        json_type_name(value)
    ))
}

fn type_label(schema: &Value) -> String {
    match schema.get("type") {
        Some(Value::String(expected)) => expected.clone(),
        Some(Value::Array(options)) => options
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("|"),
        _ => "any".to_string(),
    }
}

fn join(parent: Option<&str>, key: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}.{key}"),
        None => key.to_string(),
    }
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
