//! In-process transport backed by channels.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::MCPTransport;
use crate::error::{McpToolsError, Result};

/// Client half of an in-process transport pair.
#[derive(Debug)]
pub struct MemoryTransport {
    to_peer: Option<mpsc::UnboundedSender<Value>>,
    from_peer: mpsc::UnboundedReceiver<Value>,
}

/// Server half of an in-process transport pair.
#[derive(Debug)]
pub struct MemoryPeer {
    from_client: mpsc::UnboundedReceiver<Value>,
    to_client: Option<mpsc::UnboundedSender<Value>>,
}

/// Create a connected client/server pair.
pub fn memory_pair() -> (MemoryTransport, MemoryPeer) {
    let (client_tx, client_rx) = mpsc::unbounded_channel();
    let (server_tx, server_rx) = mpsc::unbounded_channel();
    (
        MemoryTransport {
            to_peer: Some(client_tx),
            from_peer: server_rx,
        },
        MemoryPeer {
            from_client: client_rx,
            to_client: Some(server_tx),
        },
    )
}

#[async_trait]
impl MCPTransport for MemoryTransport {
    async fn send(&mut self, frame: Value) -> Result<()> {
        let sender = self
            .to_peer
            .as_ref()
            .ok_or_else(|| McpToolsError::transport("memory", "transport closed"))?;
        sender
            .send(frame)
            .map_err(|_| McpToolsError::transport("memory", "peer disconnected"))
    }

    async fn receive(&mut self) -> Result<Option<Value>> {
        if self.to_peer.is_none() {
            return Ok(None);
        }
        Ok(self.from_peer.recv().await)
    }

    async fn close(&mut self) -> Result<()> {
        self.to_peer = None;
        self.from_peer.close();
        Ok(())
    }
}

impl MemoryPeer {
    /// Next frame sent by the client, or `None` once the client is gone.
    pub async fn next_frame(&mut self) -> Option<Value> {
        self.from_client.recv().await
    }

    /// A frame the client has already sent, without waiting.
    pub fn try_next_frame(&mut self) -> Option<Value> {
        self.from_client.try_recv().ok()
    }

    /// Deliver a frame to the client. Returns `false` if the client is gone.
    pub fn send(&self, frame: Value) -> bool {
        self.to_client
            .as_ref()
            .is_some_and(|tx| tx.send(frame).is_ok())
    }

    /// Drop the server side of the connection; the client sees end of stream.
    pub fn disconnect(&mut self) {
        self.to_client = None;
    }
}
