//! Error types for mcp-agent-tools.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all session, registry and routing operations.
#[derive(Error, Debug)]
pub enum McpToolsError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error ({server}): {message}")]
    Transport { server: String, message: String },

    #[error("Handshake with '{server}' failed: {message}")]
    Handshake { server: String, message: String },

    #[error("Arguments for tool '{tool}' do not match its input schema: {message}")]
    SchemaValidation { tool: String, message: String },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Connection to '{0}' lost")]
    ConnectionLost(String),

    #[error("Request cancelled: {0}")]
    Cancelled(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("MCP error {code} from '{server}': {message}")]
    Protocol {
        server: String,
        code: i64,
        message: String,
    },

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Tool conversion error: {0}")]
    Conversion(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl McpToolsError {
    /// Create a transport error for one server.
    pub fn transport(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            server: server.into(),
            message: message.into(),
        }
    }

    /// Create a handshake error for one server.
    pub fn handshake(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handshake {
            server: server.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport { .. } | Self::Io(_) => ErrorCategory::Transport,
            Self::ConnectionLost(_) => ErrorCategory::ConnectionLost,
            Self::Handshake { .. } => ErrorCategory::Handshake,
            Self::SchemaValidation { .. } | Self::InvalidArgument(_) => {
                ErrorCategory::InvalidInput
            }
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::UnknownTool(_) => ErrorCategory::Routing,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Protocol { .. } => ErrorCategory::Protocol,
            Self::ToolExecution { .. } | Self::Conversion(_) => ErrorCategory::ToolExecution,
            Self::Cancelled(_) => ErrorCategory::Cancelled,
            Self::InvalidState(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transport | ErrorCategory::Timeout | ErrorCategory::ConnectionLost
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Transport | ErrorCategory::ConnectionLost => {
                RecoverySuggestion::Reconnect
            }
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Handshake | ErrorCategory::Configuration => {
                RecoverySuggestion::CheckConfiguration
            }
            ErrorCategory::InvalidInput => RecoverySuggestion::FixArguments,
            ErrorCategory::Routing => RecoverySuggestion::RefreshTools,
            ErrorCategory::ToolExecution => RecoverySuggestion::CheckToolImplementation,
            _ => RecoverySuggestion::ReportBug,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, McpToolsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_timeout_errors_are_retryable() {
        assert!(McpToolsError::transport("a", "broken pipe").is_retryable());
        assert!(McpToolsError::Timeout(250).is_retryable());
        assert!(McpToolsError::ConnectionLost("a".into()).is_retryable());
    }

    #[test]
    fn handshake_and_schema_errors_are_not_retryable() {
        assert!(!McpToolsError::handshake("a", "version").is_retryable());
        let schema = McpToolsError::SchemaValidation {
            tool: "search".into(),
            message: "missing required field 'q'".into(),
        };
        assert!(!schema.is_retryable());
        assert_eq!(schema.recovery_suggestion(), RecoverySuggestion::FixArguments);
    }

    #[test]
    fn unknown_tool_suggests_refresh() {
        let err = McpToolsError::UnknownTool("alpha__search".into());
        assert_eq!(err.category(), ErrorCategory::Routing);
        assert_eq!(err.recovery_suggestion(), RecoverySuggestion::RefreshTools);
    }

    #[test]
    fn display_includes_server_context() {
        let err = McpToolsError::Protocol {
            server: "beta".into(),
            code: -32601,
            message: "Method not found".into(),
        };
        assert_eq!(
            err.to_string(),
            "MCP error -32601 from 'beta': Method not found"
        );
    }
}
