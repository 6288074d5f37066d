//! Agent-facing tool abstractions over discovered MCP tools.

pub mod arguments;
pub mod dynamic;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use dynamic::{DynamicTool, DynamicToolAdapter, DynamicToolProvider};
pub use tool::{Tool, ToolExecutionContext};
pub use types::AgentToolParameters;
