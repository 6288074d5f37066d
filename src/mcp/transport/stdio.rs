use std::collections::BTreeMap;

use async_trait::async_trait;
use rmcp::transport::TokioChildProcess;
use serde_json::Value;
use tokio::process::Command;

use super::common::{ErasedRoleClientTransport, RmcpFrameTransport};
use super::MCPTransport;
use crate::error::{McpToolsError, Result};

/// Stdio-based MCP transport (for local MCP servers).
///
/// The child process is spawned on construction and killed when the
/// transport is closed or dropped.
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
    inner: RmcpFrameTransport,
}

impl StdioTransport {
    /// Spawn `command` with `args`, adding `env` to the inherited environment.
    pub fn spawn(
        server: &str,
        command: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let mut child = Command::new(command);
        child.args(args).envs(env);
        let transport = TokioChildProcess::new(child).map_err(|error| {
            McpToolsError::transport(server, format!("failed to spawn '{command}': {error}"))
        })?;
        tracing::debug!(server, command, ?args, "spawned MCP server process");

        Ok(Self {
            command: command.to_owned(),
            args: args.to_vec(),
            inner: RmcpFrameTransport::new(
                server,
                Box::new(ErasedRoleClientTransport::new(server, transport)),
            ),
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl MCPTransport for StdioTransport {
    async fn send(&mut self, frame: Value) -> Result<()> {
        self.inner.send(frame).await
    }

    async fn receive(&mut self) -> Result<Option<Value>> {
        self.inner.receive().await
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_failure_names_the_command() {
        let err = StdioTransport::spawn(
            "alpha",
            "definitely-not-an-mcp-server-binary",
            &[],
            &BTreeMap::new(),
        )
        .err()
        .expect("missing binary should fail to spawn");
        match err {
            McpToolsError::Transport { server, message } => {
                assert_eq!(server, "alpha");
                assert!(message.contains("definitely-not-an-mcp-server-binary"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
