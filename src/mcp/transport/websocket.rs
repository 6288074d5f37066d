use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::MCPTransport;
use crate::error::{McpToolsError, Result};

/// WebSocket transport: one JSON-RPC frame per text message.
pub struct WebSocketTransport {
    server: String,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

impl WebSocketTransport {
    pub async fn connect(
        server: &str,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let mut request = url.into_client_request().map_err(|error| {
            McpToolsError::Configuration(format!("server '{server}': invalid websocket url: {error}"))
        })?;
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|error| {
                McpToolsError::Configuration(format!("server '{server}': header '{name}': {error}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|error| {
                McpToolsError::Configuration(format!("server '{server}': header '{name}': {error}"))
            })?;
            request.headers_mut().insert(name, value);
        }

        let (stream, response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|error| McpToolsError::transport(server, error.to_string()))?;
        tracing::debug!(server, status = %response.status(), "websocket connected");

        Ok(Self {
            server: server.to_owned(),
            stream,
            closed: false,
        })
    }
}

#[async_trait]
impl MCPTransport for WebSocketTransport {
    async fn send(&mut self, frame: Value) -> Result<()> {
        if self.closed {
            return Err(McpToolsError::transport(&self.server, "websocket closed"));
        }
        let text = serde_json::to_string(&frame)?;
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|error| McpToolsError::transport(&self.server, error.to_string()))
    }

    async fn receive(&mut self) -> Result<Option<Value>> {
        if self.closed {
            return Ok(None);
        }
        while let Some(message) = self.stream.next().await {
            let message =
                message.map_err(|error| McpToolsError::transport(&self.server, error.to_string()))?;
            let parsed = match message {
                Message::Text(text) => serde_json::from_str::<Value>(&text),
                Message::Binary(bytes) => serde_json::from_slice::<Value>(&bytes),
                Message::Close(frame) => {
                    tracing::debug!(server = %self.server, ?frame, "websocket closed by peer");
                    return Ok(None);
                }
                // tungstenite answers pings itself.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };
            match parsed {
                Ok(frame) => return Ok(Some(frame)),
                Err(error) => {
                    tracing::warn!(server = %self.server, %error, "dropping non-JSON websocket frame");
                }
            }
        }
        Ok(None)
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // The peer may already be gone; there is nothing left to release then.
        if let Err(error) = self.stream.close(None).await {
            tracing::debug!(server = %self.server, %error, "websocket close after peer shutdown");
        }
        Ok(())
    }
}
