//! Convenience re-exports for common use.

pub use crate::agent::{McpToolProvider, ToolDeclaration};
pub use crate::config::{McpToolsConfig, ServerEndpoint, SessionConfig, TransportKind};
pub use crate::error::{McpToolsError, Result};
pub use crate::mcp::{
    CallOptions, ConnectReport, ProtocolSession, SessionManager, SessionState, ToolCallOutcome,
    ToolCallResult, ToolDescriptor, ToolKey,
};
pub use crate::tools::{AgentToolParameters, Tool, ToolArguments, ToolExecutionContext};
