use async_trait::async_trait;
use rmcp::model::ClientJsonRpcMessage;
use rmcp::service::{RoleClient, RxJsonRpcMessage, TxJsonRpcMessage};
use rmcp::transport::Transport as RmcpTransport;
use serde_json::Value;

use super::MCPTransport;
use crate::error::{McpToolsError, Result};

fn map_transport_error(
    server: &str,
    operation: &'static str,
    error: impl std::fmt::Display,
) -> McpToolsError {
    McpToolsError::transport(server, format!("mcp transport {operation} failed: {error}"))
}

#[async_trait]
pub(super) trait DynRoleClientTransport: Send {
    async fn send(&mut self, message: TxJsonRpcMessage<RoleClient>) -> Result<()>;
    async fn receive(&mut self) -> Option<RxJsonRpcMessage<RoleClient>>;
    async fn close(&mut self) -> Result<()>;
}

pub(super) struct ErasedRoleClientTransport<T>
where
    T: RmcpTransport<RoleClient> + Send,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    server: String,
    inner: T,
}

impl<T> ErasedRoleClientTransport<T>
where
    T: RmcpTransport<RoleClient> + Send,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    pub(super) fn new(server: &str, inner: T) -> Self {
        Self {
            server: server.to_owned(),
            inner,
        }
    }
}

#[async_trait]
impl<T> DynRoleClientTransport for ErasedRoleClientTransport<T>
where
    T: RmcpTransport<RoleClient> + Send,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    async fn send(&mut self, message: TxJsonRpcMessage<RoleClient>) -> Result<()> {
        RmcpTransport::send(&mut self.inner, message)
            .await
            .map_err(|error| map_transport_error(&self.server, "send", error))
    }

    async fn receive(&mut self) -> Option<RxJsonRpcMessage<RoleClient>> {
        RmcpTransport::receive(&mut self.inner).await
    }

    async fn close(&mut self) -> Result<()> {
        RmcpTransport::close(&mut self.inner)
            .await
            .map_err(|error| map_transport_error(&self.server, "close", error))
    }
}

/// Adapts an rmcp client transport to JSON-value frames.
pub(super) struct RmcpFrameTransport {
    server: String,
    inner: Box<dyn DynRoleClientTransport>,
    closed: bool,
}

impl RmcpFrameTransport {
    pub(super) fn new(server: &str, inner: Box<dyn DynRoleClientTransport>) -> Self {
        Self {
            server: server.to_owned(),
            inner,
            closed: false,
        }
    }
}

#[async_trait]
impl MCPTransport for RmcpFrameTransport {
    async fn send(&mut self, frame: Value) -> Result<()> {
        if self.closed {
            return Err(McpToolsError::transport(&self.server, "MCP transport closed"));
        }
        let message: ClientJsonRpcMessage = serde_json::from_value(frame).map_err(|error| {
            McpToolsError::transport(&self.server, format!("unencodable frame: {error}"))
        })?;
        self.inner.send(message).await
    }

    async fn receive(&mut self) -> Result<Option<Value>> {
        if self.closed {
            return Ok(None);
        }
        match self.inner.receive().await {
            Some(message) => Ok(Some(serde_json::to_value(message)?)),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.close().await
    }
}
