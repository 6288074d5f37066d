//! Agent adapter: exposes MCP tools to agent frameworks.

pub mod declaration;
pub mod provider;

pub use declaration::{convert_all, DeclaredInput, InputType, ToolDeclaration, DEFAULT_OUTPUT_TYPE};
pub use provider::McpToolProvider;
