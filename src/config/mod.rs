//! Configuration: server endpoints and session tuning.
//!
//! Endpoints are supplied at [`SessionManager`](crate::mcp::SessionManager)
//! construction and are immutable afterwards. They can be built in code or
//! loaded from a TOML file / `mcpServers` JSON document (see [`file`]).

pub mod file;

pub use file::{default_config_path, expand_env_placeholders, McpToolsConfig};

use std::collections::BTreeMap;
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::McpToolsError;
use crate::mcp::registry::KEY_SEPARATOR;
use crate::util::retry::RetryPolicy;

/// MCP protocol revisions this client can speak, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

/// How to reach one MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum TransportKind {
    /// Spawn a local process and speak newline-delimited JSON-RPC over stdio.
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
    },
    /// Streamable HTTP (POST + optional SSE responses).
    StreamableHttp {
        url: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
    /// Persistent websocket carrying one JSON-RPC message per text frame.
    #[serde(rename = "websocket")]
    WebSocket {
        url: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
}

impl TransportKind {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stdio { .. } => "stdio",
            Self::StreamableHttp { .. } => "streamable_http",
            Self::WebSocket { .. } => "websocket",
        }
    }

    /// Human-readable address (command line or URL) for logs and reports.
    pub fn address(&self) -> String {
        match self {
            Self::Stdio { command, args, .. } if args.is_empty() => command.clone(),
            Self::Stdio { command, args, .. } => format!("{command} {}", args.join(" ")),
            Self::StreamableHttp { url, .. } | Self::WebSocket { url, .. } => url.clone(),
        }
    }
}

/// One configured MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEndpoint {
    /// Stable identity, used as the namespace of this server's tools.
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(flatten)]
    pub transport: TransportKind,
    /// Per-server override of the default request timeout.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl ServerEndpoint {
    pub fn new(id: impl Into<String>, transport: TransportKind) -> Self {
        Self {
            id: id.into(),
            label: None,
            transport,
            request_timeout_ms: None,
        }
    }

    pub fn stdio(id: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self::new(
            id,
            TransportKind::Stdio {
                command: command.into(),
                args,
                env: BTreeMap::new(),
            },
        )
    }

    pub fn streamable_http(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(
            id,
            TransportKind::StreamableHttp {
                url: url.into(),
                headers: BTreeMap::new(),
            },
        )
    }

    pub fn websocket(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(
            id,
            TransportKind::WebSocket {
                url: url.into(),
                headers: BTreeMap::new(),
            },
        )
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Trim the id and reject values that cannot be used as a tool namespace.
    pub(crate) fn normalized(mut self) -> Result<Self, McpToolsError> {
        let id = self.id.trim().to_owned();
        if id.is_empty() {
            return Err(McpToolsError::Configuration(
                "MCP server id must not be empty".into(),
            ));
        }
        if id.contains(KEY_SEPARATOR) {
            return Err(McpToolsError::Configuration(format!(
                "MCP server id '{id}' must not contain '{KEY_SEPARATOR}'"
            )));
        }
        self.id = id;
        Ok(self)
    }
}

/// Client-side settings shared by every session a manager creates.
#[derive(Debug, Clone, Builder)]
pub struct SessionConfig {
    #[builder(into, default = env!("CARGO_PKG_NAME").to_string())]
    pub client_name: String,
    #[builder(into, default = env!("CARGO_PKG_VERSION").to_string())]
    pub client_version: String,
    /// Offered during the handshake, newest first. The first entry is requested.
    #[builder(default = SUPPORTED_PROTOCOL_VERSIONS.iter().map(|v| v.to_string()).collect())]
    pub protocol_versions: Vec<String>,
    /// Applied to calls that do not pass their own timeout.
    #[builder(default = Duration::from_secs(30))]
    pub request_timeout: Duration,
    /// Bounds transport open + handshake for one connect attempt.
    #[builder(default = Duration::from_secs(10))]
    pub connect_timeout: Duration,
    /// Attempts made inside one explicit connect call. Never runs in the background.
    #[builder(default = RetryPolicy::default())]
    pub connect_retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SessionConfig {
    pub fn supports_version(&self, version: &str) -> bool {
        self.protocol_versions.iter().any(|v| v == version)
    }

    pub fn preferred_version(&self) -> &str {
        self.protocol_versions
            .first()
            .map(String::as_str)
            .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_id_is_trimmed() {
        let endpoint = ServerEndpoint::stdio("  files ", "node", vec![])
            .normalized()
            .expect("valid id");
        assert_eq!(endpoint.id, "files");
    }

    #[test]
    fn endpoint_rejects_empty_and_separator_ids() {
        let err = ServerEndpoint::stdio("  ", "node", vec![])
            .normalized()
            .expect_err("blank id");
        assert!(matches!(err, McpToolsError::Configuration(m) if m.contains("empty")));

        let err = ServerEndpoint::stdio("a__b", "node", vec![])
            .normalized()
            .expect_err("separator in id");
        assert!(matches!(err, McpToolsError::Configuration(m) if m.contains("__")));
    }

    #[test]
    fn session_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.connect_retry.max_attempts, 3);
        assert_eq!(config.preferred_version(), "2025-06-18");
        assert!(config.supports_version("2024-11-05"));
        assert!(!config.supports_version("1999-01-01"));
    }

    #[test]
    fn session_config_builder_overrides() {
        let config = SessionConfig::builder()
            .client_name("agent")
            .request_timeout(Duration::from_millis(500))
            .protocol_versions(vec!["2024-11-05".into()])
            .build();
        assert_eq!(config.client_name, "agent");
        assert_eq!(config.request_timeout, Duration::from_millis(500));
        assert_eq!(config.preferred_version(), "2024-11-05");
    }

    #[test]
    fn transport_address_formats_command_line() {
        let endpoint = ServerEndpoint::stdio("files", "npx", vec!["-y".into(), "server".into()]);
        assert_eq!(endpoint.transport.address(), "npx -y server");
        assert_eq!(endpoint.transport.kind(), "stdio");
    }
}
