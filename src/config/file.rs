//! Loading endpoint definitions from disk.
//!
//! Two layouts are accepted:
//!
//! ```toml
//! request_timeout_ms = 20000
//!
//! [[servers]]
//! id = "files"
//! transport = "stdio"
//! command = "npx"
//! args = ["-y", "@modelcontextprotocol/server-filesystem", "."]
//!
//! [[servers]]
//! id = "search"
//! transport = "streamable_http"
//! url = "https://search.example.com/mcp"
//! headers = { Authorization = "Bearer ${SEARCH_TOKEN}" }
//! ```
//!
//! and the `mcpServers` JSON document used by desktop MCP hosts.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::{ServerEndpoint, SessionConfig, TransportKind};
use crate::error::McpToolsError;

/// Environment variable that overrides the default config location.
pub const CONFIG_PATH_ENV: &str = "MCP_AGENT_TOOLS_CONFIG";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct McpToolsConfig {
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default)]
    pub servers: Vec<ServerEndpoint>,
}

impl McpToolsConfig {
    /// Load a config file, choosing the parser from the extension (`.json` or TOML).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, McpToolsError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&raw)?,
            _ => Self::from_toml_str(&raw)?,
        };
        tracing::debug!(
            path = %path.display(),
            servers = config.servers.len(),
            "Loaded MCP server config"
        );
        Ok(config)
    }

    /// Load from `$MCP_AGENT_TOOLS_CONFIG` or the platform config directory.
    pub fn load_default() -> Result<Self, McpToolsError> {
        Self::load(default_config_path())
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, McpToolsError> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| McpToolsError::Configuration(format!("invalid TOML config: {e}")))?;
        config.finish()
    }

    /// Parse the `{"mcpServers": {...}}` layout. Servers are ordered by name.
    pub fn from_json_str(raw: &str) -> Result<Self, McpToolsError> {
        let document: McpServersDocument = serde_json::from_str(raw)?;
        let servers = document
            .mcp_servers
            .into_iter()
            .map(|(id, entry)| ServerEndpoint::new(id, entry.into_transport()))
            .collect();
        Self {
            servers,
            ..Self::default()
        }
        .finish()
    }

    /// Session settings with file overrides applied on top of the defaults.
    pub fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::default();
        if let Some(name) = &self.client_name {
            config.client_name = name.clone();
        }
        if let Some(ms) = self.request_timeout_ms {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.connect_timeout = Duration::from_millis(ms);
        }
        config
    }

    fn finish(mut self) -> Result<Self, McpToolsError> {
        let mut seen = HashSet::new();
        let mut servers = Vec::with_capacity(self.servers.len());
        for endpoint in self.servers {
            let mut endpoint = endpoint.normalized()?;
            if !seen.insert(endpoint.id.clone()) {
                return Err(McpToolsError::Configuration(format!(
                    "Duplicate MCP server id '{}'",
                    endpoint.id
                )));
            }
            expand_transport(&mut endpoint.transport);
            servers.push(endpoint);
        }
        self.servers = servers;
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
struct McpServersDocument {
    #[serde(rename = "mcpServers")]
    mcp_servers: BTreeMap<String, McpServerEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum McpServerEntry {
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
    },
    Remote {
        url: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
}

impl McpServerEntry {
    fn into_transport(self) -> TransportKind {
        match self {
            Self::Stdio { command, args, env } => TransportKind::Stdio { command, args, env },
            Self::Remote { url, headers } if url.starts_with("ws://") || url.starts_with("wss://") => {
                TransportKind::WebSocket { url, headers }
            }
            Self::Remote { url, headers } => TransportKind::StreamableHttp { url, headers },
        }
    }
}

fn expand_transport(transport: &mut TransportKind) {
    match transport {
        TransportKind::Stdio { args, env, .. } => {
            for arg in args.iter_mut() {
                *arg = expand_env_placeholders(arg);
            }
            for value in env.values_mut() {
                *value = expand_env_placeholders(value);
            }
        }
        TransportKind::StreamableHttp { url, headers } | TransportKind::WebSocket { url, headers } => {
            *url = expand_env_placeholders(url);
            for value in headers.values_mut() {
                *value = expand_env_placeholders(value);
            }
        }
    }
}

/// Replace `${NAME}` with the value of environment variable `NAME`.
///
/// Unset variables are left in place so the failure shows up at the server,
/// not as a silently empty credential.
pub fn expand_env_placeholders(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match std::env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) => {
                tracing::warn!(variable = name, "Config placeholder refers to unset variable");
                out.push_str(&rest[start..start + 2 + end + 1]);
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// `$MCP_AGENT_TOOLS_CONFIG`, else `<config dir>/mcp-agent-tools/servers.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    directories::ProjectDirs::from("", "", "mcp-agent-tools")
        .map(|dirs| dirs.config_dir().join("servers.toml"))
        .unwrap_or_else(|| PathBuf::from("mcp-agent-tools.toml"))
}
