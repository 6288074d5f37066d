//! Flattened tool declarations for agent frameworks that expect a
//! `name / description / inputs / output_type` shape instead of raw JSON Schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{McpToolsError, Result};
use crate::mcp::registry::RegisteredTool;
use crate::mcp::schema::ToolDescriptor;
use crate::tools::ToolArguments;

/// Output type reported for every converted tool.
pub const DEFAULT_OUTPUT_TYPE: &str = "string";

/// Input name some frameworks cannot accept; exposed as [`FALLBACK_INPUT`].
const RESERVED_INPUT: &str = "kwargs";
const FALLBACK_INPUT: &str = "query";
const FALLBACK_DESCRIPTION: &str = "Input query for the tool";

/// Normalized JSON type of a declared input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InputType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl InputType {
    /// Read the `type` of a property schema. Unknown or missing types are `String`;
    /// for a type union the first non-null member wins.
    pub fn from_schema(schema: &Value) -> Self {
        match schema.get("type") {
            Some(Value::String(name)) => Self::from_name(name),
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .find(|name| *name != "null")
                .map(Self::from_name)
                .unwrap_or(Self::String),
            _ => Self::String,
        }
    }

    fn from_name(name: &str) -> Self {
        match name {
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            _ => Self::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredInput {
    #[serde(rename = "type")]
    pub kind: InputType,
    pub description: String,
}

/// One tool as presented to an agent framework.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDeclaration {
    /// Exposed name (`server__tool`), routable through the session manager.
    pub name: String,
    pub description: String,
    pub inputs: BTreeMap<String, DeclaredInput>,
    pub output_type: &'static str,
    /// Set when the server's `kwargs` input was renamed to `query`. Never set
    /// when the server also declares `query`.
    #[serde(skip)]
    renamed_reserved: bool,
}

impl ToolDeclaration {
    pub fn from_descriptor(exposed_name: &str, descriptor: &ToolDescriptor) -> Result<Self> {
        if descriptor.name.trim().is_empty() {
            return Err(McpToolsError::Conversion(format!(
                "tool from server '{}' has no name",
                descriptor.server_id
            )));
        }

        let properties = match descriptor.input_schema.get("properties") {
            None | Some(Value::Null) => None,
            Some(Value::Object(properties)) => Some(properties),
            Some(_) => {
                return Err(McpToolsError::Conversion(format!(
                    "tool '{exposed_name}': input schema properties must be an object"
                )))
            }
        };

        let query_taken = properties.is_some_and(|p| p.contains_key(FALLBACK_INPUT));
        let mut inputs = BTreeMap::new();
        let mut renamed_reserved = false;
        for (name, schema) in properties.into_iter().flatten() {
            if !schema.is_object() {
                return Err(McpToolsError::Conversion(format!(
                    "tool '{exposed_name}': schema for parameter '{name}' must be an object"
                )));
            }
            let declared_name = if name == RESERVED_INPUT && !query_taken {
                renamed_reserved = true;
                FALLBACK_INPUT
            } else {
                if name == RESERVED_INPUT {
                    tracing::warn!(tool = exposed_name, "tool declares both kwargs and query; kwargs kept as is");
                }
                name.as_str()
            };
            let description = schema
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Parameter: {declared_name}"));
            inputs.insert(
                declared_name.to_owned(),
                DeclaredInput {
                    kind: InputType::from_schema(schema),
                    description,
                },
            );
        }

        if inputs.is_empty() {
            inputs.insert(
                FALLBACK_INPUT.to_owned(),
                DeclaredInput {
                    kind: InputType::String,
                    description: FALLBACK_DESCRIPTION.to_owned(),
                },
            );
        }

        let description = descriptor
            .description
            .clone()
            .or_else(|| descriptor.title.clone())
            .unwrap_or_default();

        Ok(Self {
            name: exposed_name.to_owned(),
            description,
            inputs,
            output_type: DEFAULT_OUTPUT_TYPE,
            renamed_reserved,
        })
    }

    pub fn from_registered<S>(tool: &RegisteredTool<S>) -> Result<Self> {
        Self::from_descriptor(&tool.key.exposed_name(), &tool.descriptor)
    }

    /// Whether the server-side `kwargs` input is exposed as `query`.
    pub fn renames_reserved_input(&self) -> bool {
        self.renamed_reserved
    }

    /// Map agent-supplied arguments back to the names the server declared.
    pub fn server_arguments(&self, mut args: ToolArguments) -> ToolArguments {
        if self.renamed_reserved {
            args.rename_key(FALLBACK_INPUT, RESERVED_INPUT);
        }
        args
    }
}

/// Convert every tool, skipping those that fail.
///
/// Fails only when nothing converted and at least one tool produced an error.
pub fn convert_all<S>(tools: &[RegisteredTool<S>]) -> Result<Vec<ToolDeclaration>> {
    let mut declarations = Vec::with_capacity(tools.len());
    let mut errors = Vec::new();
    for tool in tools {
        match ToolDeclaration::from_registered(tool) {
            Ok(declaration) => declarations.push(declaration),
            Err(err) => {
                tracing::error!(tool = %tool.key, error = %err, "failed to convert MCP tool");
                errors.push(format!("{}: {err}", tool.key));
            }
        }
    }
    tracing::info!(converted = declarations.len(), failed = errors.len(), "converted MCP tools");
    if declarations.is_empty() && !errors.is_empty() {
        return Err(McpToolsError::Conversion(format!(
            "failed to convert any tools. Errors: {}",
            errors.join(", ")
        )));
    }
    Ok(declarations)
}
