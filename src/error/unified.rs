//! Error classification and recovery.

use serde::{Deserialize, Serialize};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Transport,
    ConnectionLost,
    Handshake,
    InvalidInput,
    Timeout,
    Routing,
    Protocol,
    Configuration,
    Serialization,
    ToolExecution,
    Cancelled,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoverySuggestion {
    Reconnect,
    IncreaseTimeout,
    CheckConfiguration,
    FixArguments,
    RefreshTools,
    CheckToolImplementation,
    ReportBug,
}
