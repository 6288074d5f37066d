//! MCP schema types: tool/resource descriptors and tool-call results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::protocol::{RequestId, RpcError};
use crate::error::McpToolsError;

/// A tool advertised by one server.
///
/// `name` is unique within `server_id` only; use a
/// [`ToolKey`](super::registry::ToolKey) to address tools across servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Owning server (lookup-only back reference).
    pub server_id: String,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub input_schema: Value,
    /// Declared shape of `structuredContent`, when the server provides one.
    pub output_schema: Option<Value>,
}

impl ToolDescriptor {
    pub fn new(server_id: impl Into<String>, name: impl Into<String>, input_schema: Value) -> Self {
        Self {
            server_id: server_id.into(),
            name: name.into(),
            title: None,
            description: None,
            input_schema,
            output_schema: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Tool entry as it appears in a `tools/list` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireTool {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,
    #[serde(default)]
    pub output_schema: Option<Value>,
}

impl WireTool {
    pub(crate) fn into_descriptor(self, server_id: &str) -> ToolDescriptor {
        ToolDescriptor {
            server_id: server_id.to_owned(),
            name: self.name,
            title: self.title,
            description: self.description,
            input_schema: self.input_schema,
            output_schema: self.output_schema,
        }
    }
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListToolsPage {
    #[serde(default)]
    pub tools: Vec<WireTool>,
}

/// A resource advertised by one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    #[serde(default)]
    pub server_id: String,
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListResourcesPage {
    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,
}

/// One item returned by `resources/read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Base64 payload for binary resources.
    #[serde(default)]
    pub blob: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReadResourceResult {
    #[serde(default)]
    pub contents: Vec<ResourceContents>,
}

/// Successful tool output.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolPayload {
    pub structured_content: Option<Value>,
    pub text_content: Option<String>,
    pub content: Vec<Value>,
}

impl ToolPayload {
    pub fn into_value_or_text(self) -> Value {
        if let Some(structured) = self.structured_content {
            return structured;
        }
        if let Some(text) = self.text_content {
            return Value::String(text);
        }
        Value::Array(self.content)
    }
}

/// Structured description of a failed call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolFailure {
    /// JSON-RPC error code when the server rejected the request itself;
    /// `None` when the tool ran and reported an error result.
    pub code: Option<i64>,
    pub message: String,
    pub details: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallOutcome {
    Success(ToolPayload),
    Failure(ToolFailure),
}

/// Result of one `tools/call`, tagged with the correlation id of its request.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    pub request_id: RequestId,
    pub server_id: String,
    pub tool: String,
    pub outcome: ToolCallOutcome,
}

impl ToolCallResult {
    pub(crate) fn from_response(
        request_id: RequestId,
        server_id: &str,
        tool: &str,
        response: Result<Value, RpcError>,
    ) -> Self {
        let outcome = match response {
            Ok(result) => map_call_result(result),
            Err(error) => ToolCallOutcome::Failure(ToolFailure {
                code: Some(error.code),
                message: error.message,
                details: error.data,
            }),
        };
        Self {
            request_id,
            server_id: server_id.to_owned(),
            tool: tool.to_owned(),
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ToolCallOutcome::Success(_))
    }

    pub fn payload(&self) -> Option<&ToolPayload> {
        match &self.outcome {
            ToolCallOutcome::Success(payload) => Some(payload),
            ToolCallOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ToolFailure> {
        match &self.outcome {
            ToolCallOutcome::Success(_) => None,
            ToolCallOutcome::Failure(failure) => Some(failure),
        }
    }
}

/// Normalize caller-supplied tool arguments to a JSON object.
///
/// Accepts an object, `null` (no arguments) or a string holding a JSON object.
pub fn coerce_tool_arguments(tool: &str, arguments: Value) -> Result<Value, McpToolsError> {
    let invalid = |message: String| McpToolsError::SchemaValidation {
        tool: tool.to_owned(),
        message,
    };
    match arguments {
        Value::Object(_) => Ok(arguments),
        Value::Null => Ok(Value::Object(Default::default())),
        Value::String(text) if text.trim().is_empty() => Ok(Value::Object(Default::default())),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed @ Value::Object(_)) => Ok(parsed),
            Ok(other) => Err(invalid(format!(
                "string arguments must encode a JSON object, got {other}"
            ))),
            Err(error) => Err(invalid(format!("arguments are not valid JSON: {error}"))),
        },
        other => Err(invalid(format!("arguments must be a JSON object, got {other}"))),
    }
}

fn extract_text_content(content: &[Value]) -> Option<String> {
    let mut lines = Vec::new();
    for item in content {
        match item.get("type").and_then(Value::as_str) {
            Some("text") => {
                if let Some(text) = item.get("text").and_then(Value::as_str) {
                    lines.push(text.to_owned());
                }
            }
            Some("resource") => {
                if let Some(text) = item
                    .get("resource")
                    .and_then(|r| r.get("text"))
                    .and_then(Value::as_str)
                {
                    lines.push(text.to_owned());
                }
            }
            _ => {}
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn map_call_result(result: Value) -> ToolCallOutcome {
    let content = result
        .get("content")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let structured_content = result
        .get("structuredContent")
        .filter(|v| !v.is_null())
        .cloned();
    let text_content = extract_text_content(&content);

    if result.get("isError").and_then(Value::as_bool).unwrap_or(false) {
        let message = structured_content
            .as_ref()
            .map(|v| v.to_string())
            .or_else(|| text_content.clone())
            .unwrap_or_else(|| "MCP tool returned an error result".into());
        return ToolCallOutcome::Failure(ToolFailure {
            code: None,
            message,
            details: structured_content,
        });
    }

    ToolCallOutcome::Success(ToolPayload {
        structured_content,
        text_content,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_tool_defaults_missing_schema() {
        let page: ListToolsPage = serde_json::from_value(json!({
            "tools": [
                { "name": "search", "description": "query index", "inputSchema": { "type": "object" } },
                { "name": "noop" }
            ],
            "nextCursor": "page-2"
        }))
        .expect("page should parse");

        let tools: Vec<_> = page
            .tools
            .into_iter()
            .map(|t| t.into_descriptor("alpha"))
            .collect();
        assert_eq!(tools[0].server_id, "alpha");
        assert_eq!(tools[0].description.as_deref(), Some("query index"));
        assert_eq!(tools[1].input_schema["type"], "object");
    }

    #[test]
    fn success_prefers_structured_content() {
        let result = ToolCallResult::from_response(
            3,
            "alpha",
            "weather",
            Ok(json!({
                "content": [{ "type": "text", "text": "sunny" }],
                "structuredContent": { "sky": "clear" }
            })),
        );
        assert_eq!(result.request_id, 3);
        let payload = result.payload().cloned().expect("success");
        assert_eq!(payload.text_content.as_deref(), Some("sunny"));
        assert_eq!(payload.into_value_or_text(), json!({ "sky": "clear" }));
    }

    #[test]
    fn text_only_result_collapses_to_string() {
        let result = ToolCallResult::from_response(
            1,
            "alpha",
            "echo",
            Ok(json!({
                "content": [
                    { "type": "text", "text": "line one" },
                    { "type": "resource", "resource": { "uri": "file:///a", "text": "line two" } }
                ]
            })),
        );
        let payload = result.payload().cloned().expect("success");
        assert_eq!(payload.into_value_or_text(), json!("line one\nline two"));
    }

    #[test]
    fn error_flag_becomes_failure() {
        let result = ToolCallResult::from_response(
            9,
            "alpha",
            "search_docs",
            Ok(json!({
                "content": [{ "type": "text", "text": "tool failed at runtime" }],
                "structuredContent": { "code": "TOOL_FAILURE" },
                "isError": true
            })),
        );
        let failure = result.failure().expect("failure");
        assert_eq!(failure.code, None);
        assert!(failure.message.contains("TOOL_FAILURE"));
    }

    #[test]
    fn coerces_null_and_json_string_arguments() {
        assert_eq!(coerce_tool_arguments("t", Value::Null).unwrap(), json!({}));
        assert_eq!(
            coerce_tool_arguments("t", json!("{\"q\": \"rust\"}")).unwrap(),
            json!({ "q": "rust" })
        );
        assert_eq!(coerce_tool_arguments("t", json!("  ")).unwrap(), json!({}));
    }

    #[test]
    fn rejects_non_object_arguments() {
        for bad in [json!(3), json!([1]), json!("[1, 2]"), json!("{not json")] {
            let err = coerce_tool_arguments("search", bad).expect_err("should reject");
            assert!(matches!(err, McpToolsError::SchemaValidation { ref tool, .. } if tool == "search"));
        }
    }

    #[test]
    fn rpc_error_becomes_failure_with_code() {
        let result = ToolCallResult::from_response(
            2,
            "alpha",
            "missing",
            Err(RpcError {
                code: -32602,
                message: "Unknown tool: missing".into(),
                data: None,
            }),
        );
        assert!(!result.is_success());
        assert_eq!(result.failure().and_then(|f| f.code), Some(-32602));
    }
}
