//! MCP transport layer.
//!
//! A transport moves whole JSON-RPC frames. It knows nothing about ids,
//! methods or sessions; [`ProtocolSession`](super::session::ProtocolSession)
//! owns exactly one transport and drives it from a single task.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{ServerEndpoint, TransportKind};
use crate::error::Result;

/// Frame-level channel to one MCP server.
#[async_trait]
pub trait MCPTransport: Send {
    /// Send one JSON-RPC frame.
    async fn send(&mut self, frame: Value) -> Result<()>;

    /// Receive the next JSON-RPC frame, or `None` once the peer has closed.
    ///
    /// Must be cancel-safe: the session polls this inside `select!` and drops
    /// the future whenever an outbound frame is ready.
    async fn receive(&mut self) -> Result<Option<Value>>;

    /// Close the transport. Calling this more than once is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Opens transports for endpoints.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    async fn connect(&self, endpoint: &ServerEndpoint) -> Result<Box<dyn MCPTransport>>;
}

/// Connector for the built-in stdio, streamable HTTP and websocket transports.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConnector;

#[async_trait]
impl TransportConnector for DefaultConnector {
    async fn connect(&self, endpoint: &ServerEndpoint) -> Result<Box<dyn MCPTransport>> {
        tracing::debug!(
            server = %endpoint.id,
            transport = endpoint.transport.kind(),
            address = %endpoint.transport.address(),
            "opening MCP transport"
        );
        match &endpoint.transport {
            TransportKind::Stdio { command, args, env } => Ok(Box::new(StdioTransport::spawn(
                &endpoint.id,
                command,
                args,
                env,
            )?)),
            TransportKind::StreamableHttp { url, headers } => Ok(Box::new(
                StreamableHttpTransport::open(&endpoint.id, url, headers)?,
            )),
            TransportKind::WebSocket { url, headers } => Ok(Box::new(
                WebSocketTransport::connect(&endpoint.id, url, headers).await?,
            )),
        }
    }
}

mod common;
mod http;
mod memory;
mod stdio;
mod websocket;

pub use http::StreamableHttpTransport;
pub use memory::{memory_pair, MemoryPeer, MemoryTransport};
pub use stdio::StdioTransport;
pub use websocket::WebSocketTransport;

#[cfg(test)]
mod test_support;
